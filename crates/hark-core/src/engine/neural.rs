//! Neural recognition backend: wav2vec2 CTC inference through ONNX Runtime.
//!
//! The pretrained acoustic model is resolved through the model store (cache
//! first, one-time download) and bound to a compute device when the engine
//! is constructed; the loaded session is then reused across `recognize`
//! calls on the same instance. Decoding is greedy CTC: per-timestep arg-max,
//! no beam search, no language-model rescoring.

use ndarray::{Array2, ArrayViewD, Axis};
use tracing::{debug, info};

use super::{EngineKind, RecognitionEngine};
use crate::audio::AudioBuffer;
use crate::config::{DeviceBinding, NeuralSettings};
use crate::error::{Error, Result};
use crate::model;

/// CTC label set of the pretrained model, indexed by class id.
const CTC_LABELS: [&str; 32] = [
    "<pad>", "<s>", "</s>", "<unk>", "|", "E", "T", "A", "O", "N", "I", "H", "S", "R", "D", "L",
    "U", "M", "W", "C", "F", "G", "Y", "P", "B", "V", "K", "'", "X", "J", "Q", "Z",
];

/// Blank (pad) class id, collapsed out during decoding.
const BLANK_ID: usize = 0;

/// Word-boundary class id, decoded as a space.
const WORD_DELIMITER_ID: usize = 4;

/// Neural inference engine.
pub struct NeuralEngine {
    session: ort::session::Session,
    language: String,
    device: DeviceBinding,
}

impl NeuralEngine {
    /// Resolve the pretrained model and bind it to a compute device.
    ///
    /// Loading happens here, as an explicit construction step. Identifier
    /// and language validation have already passed by the time this runs; a
    /// [`Error::ModelLoad`] can only mean the model fetch or the session
    /// build failed.
    pub fn new(settings: &NeuralSettings, language: String) -> Result<Self> {
        let models_dir = settings
            .models_dir
            .clone()
            .unwrap_or_else(model::default_models_dir);
        let model_path = model::ensure_model(&models_dir)?;

        info!(
            model = %model_path.display(),
            device = %settings.device,
            "loading acoustic model"
        );

        let session = ort::session::Session::builder()
            .and_then(|builder| builder.with_execution_providers(execution_providers(settings.device)))
            .and_then(|builder| builder.commit_from_file(&model_path))
            .map_err(|e| Error::ModelLoad(format!("failed to build inference session: {e}")))?;

        Ok(Self {
            session,
            language,
            device: settings.device,
        })
    }
}

impl RecognitionEngine for NeuralEngine {
    fn kind(&self) -> EngineKind {
        EngineKind::NeuralInference
    }

    fn recognize(&mut self, buffer: &AudioBuffer) -> Result<Option<String>> {
        debug!(
            language = %self.language,
            device = %self.device,
            seconds = buffer.duration_secs(),
            "running inference"
        );

        // Single-batch waveform in [-1, 1].
        let waveform = buffer.to_f32();
        let input = Array2::from_shape_vec((1, waveform.len()), waveform)
            .map_err(|e| Error::Inference(format!("failed to shape input tensor: {e}")))?;
        let tensor = ort::value::Tensor::from_array(input)
            .map_err(|e| Error::Inference(format!("failed to build input tensor: {e}")))?;

        let outputs = self
            .session
            .run(ort::inputs![tensor])
            .map_err(|e| Error::Inference(format!("forward pass failed: {e}")))?;

        let logits = outputs[0]
            .try_extract_array::<f32>()
            .map_err(|e| Error::Inference(format!("failed to read logits: {e}")))?;
        if logits.ndim() != 3 {
            return Err(Error::Inference(format!(
                "unexpected logits shape: {:?}",
                logits.shape()
            )));
        }

        let text = greedy_ctc_decode(logits.view());
        if text.is_empty() {
            Ok(None)
        } else {
            Ok(Some(text))
        }
    }
}

/// Execution providers for the requested device binding.
///
/// `Auto` registers the platform accelerator and lets the runtime fall back
/// to CPU; `Accelerated` pins it, and a missing accelerator surfaces at
/// session build; `Cpu` registers none.
fn execution_providers(
    device: DeviceBinding,
) -> Vec<ort::execution_providers::ExecutionProviderDispatch> {
    match device {
        DeviceBinding::Cpu => Vec::new(),
        DeviceBinding::Auto => vec![platform_accelerator()],
        DeviceBinding::Accelerated => vec![platform_accelerator().error_on_failure()],
    }
}

#[cfg(target_os = "macos")]
fn platform_accelerator() -> ort::execution_providers::ExecutionProviderDispatch {
    ort::execution_providers::CoreMLExecutionProvider::default().build()
}

#[cfg(target_os = "windows")]
fn platform_accelerator() -> ort::execution_providers::ExecutionProviderDispatch {
    ort::execution_providers::DirectMLExecutionProvider::default().build()
}

#[cfg(not(any(target_os = "macos", target_os = "windows")))]
fn platform_accelerator() -> ort::execution_providers::ExecutionProviderDispatch {
    ort::execution_providers::CUDAExecutionProvider::default().build()
}

/// Greedy CTC decoding over `[batch, timesteps, classes]` logits.
///
/// Per-timestep arg-max, then the standard collapse: repeated classes merge,
/// blanks separate repeats and are dropped, the word-boundary class becomes
/// a space. Surrounding whitespace is trimmed.
fn greedy_ctc_decode(logits: ArrayViewD<'_, f32>) -> String {
    let mut text = String::new();
    let mut previous = BLANK_ID;

    for step in logits.index_axis(Axis(0), 0).axis_iter(Axis(0)) {
        let class = step
            .iter()
            .enumerate()
            .max_by(|a, b| a.1.total_cmp(b.1))
            .map(|(idx, _)| idx)
            .unwrap_or(BLANK_ID);

        if class != previous && class != BLANK_ID {
            match class {
                WORD_DELIMITER_ID => text.push(' '),
                // Sentence/unknown markers carry no text.
                1..=3 => {}
                _ => {
                    if let Some(label) = CTC_LABELS.get(class) {
                        text.push_str(label);
                    }
                }
            }
        }
        previous = class;
    }

    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::Array3;

    /// Build `[1, T, 32]` logits whose per-timestep arg-max follows `classes`.
    fn logits_for(classes: &[usize]) -> Array3<f32> {
        let mut logits = Array3::<f32>::zeros((1, classes.len(), CTC_LABELS.len()));
        for (t, &class) in classes.iter().enumerate() {
            logits[[0, t, class]] = 10.0;
        }
        logits
    }

    fn decode(classes: &[usize]) -> String {
        greedy_ctc_decode(logits_for(classes).into_dyn().view())
    }

    #[test]
    fn decodes_a_simple_label_sequence() {
        // H I | H O  with repeats and blanks interleaved
        assert_eq!(decode(&[11, 11, 0, 10, 4, 11, 8, 0]), "HI HO");
    }

    #[test]
    fn blank_separates_repeated_letters() {
        // A A (collapsed) vs A <pad> A (two letters)
        assert_eq!(decode(&[7, 7]), "A");
        assert_eq!(decode(&[7, 0, 7]), "AA");
    }

    #[test]
    fn word_delimiters_collapse_to_single_spaces() {
        assert_eq!(decode(&[4, 6, 4, 0, 4, 8, 4]), "T O");
    }

    #[test]
    fn sentence_markers_carry_no_text() {
        assert_eq!(decode(&[1, 6, 2, 3]), "T");
    }

    #[test]
    fn all_blank_input_decodes_to_nothing() {
        assert_eq!(decode(&[0, 0, 0, 0]), "");
    }

    #[test]
    fn decoding_is_deterministic() {
        let classes = [12, 0, 8, 4, 9, 8, 18];
        assert_eq!(decode(&classes), decode(&classes));
    }
}
