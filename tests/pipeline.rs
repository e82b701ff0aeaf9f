//! End-to-end tests driving `VoicePipeline` with an in-memory speech model.

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]

use golos::audio::wav;
use golos::config::{AnnotatorKind, GolosConfig};
use golos::tts::{
    InferenceRequest, ModelSignature, PassthroughAnnotator, RawAudio, SpeechModel,
    StressAnnotator, SynthesisOutput, TextInput,
};
use golos::{Result, SpeechError, VoicePipeline};
use std::sync::{Arc, Mutex};
use std::time::Duration;

const MODEL_RATE: u32 = 24_000;

/// Emits a 220 Hz tone, 20 ms per input character, and records requests.
struct ToneModel {
    params: Vec<&'static str>,
    seen: Arc<Mutex<Vec<InferenceRequest>>>,
    /// Return no audio for texts containing this marker.
    silent_on: Option<&'static str>,
    /// Return the tone as a `[frames, 2]` stereo array inside a list.
    stereo_list: bool,
    /// Sleep inside inference.
    delay: Duration,
}

impl ToneModel {
    fn new() -> Self {
        Self {
            params: vec!["text", "speaker", "sample_rate"],
            seen: Arc::new(Mutex::new(Vec::new())),
            silent_on: None,
            stereo_list: false,
            delay: Duration::ZERO,
        }
    }
}

fn request_text(request: &InferenceRequest) -> String {
    match &request.text {
        TextInput::Single(text) => text.clone(),
        TextInput::Batch(texts) => texts.join(" "),
    }
}

impl SpeechModel for ToneModel {
    fn speakers(&self) -> Vec<String> {
        vec!["aidar".into(), "baya".into(), "xenia".into()]
    }

    fn sample_rate(&self) -> Option<u32> {
        Some(MODEL_RATE)
    }

    fn signature(&self) -> Option<ModelSignature> {
        Some(ModelSignature::new(self.params.iter().copied()))
    }

    fn infer(&mut self, request: &InferenceRequest) -> Result<SynthesisOutput> {
        self.seen.lock().unwrap().push(request.clone());
        std::thread::sleep(self.delay);

        let text = request_text(request);
        if self.silent_on.is_some_and(|marker| text.contains(marker)) {
            return Ok(SynthesisOutput::Single(RawAudio::mono(Vec::new())));
        }

        let n = text.chars().count() * (MODEL_RATE as usize / 50);
        let tone: Vec<f32> = (0..n)
            .map(|i| {
                (2.0 * std::f32::consts::PI * 220.0 * i as f32 / MODEL_RATE as f32).sin() * 0.4
                    + 0.05
            })
            .collect();

        if self.stereo_list {
            let interleaved: Vec<f32> = tone.iter().flat_map(|&s| [s, s]).collect();
            return Ok(SynthesisOutput::List(vec![RawAudio::with_shape(
                interleaved,
                vec![n, 2],
            )]));
        }
        Ok(SynthesisOutput::Single(RawAudio::mono(tone)))
    }
}

/// Wraps every word in `+` markers so annotation is visible downstream.
struct MarkingAnnotator;

impl StressAnnotator for MarkingAnnotator {
    fn annotate(&self, text: &str) -> Result<String> {
        Ok(text
            .split(' ')
            .map(|w| format!("+{w}"))
            .collect::<Vec<_>>()
            .join(" "))
    }
}

struct EmptyAnnotator;

impl StressAnnotator for EmptyAnnotator {
    fn annotate(&self, _text: &str) -> Result<String> {
        Ok("  ".into())
    }
}

fn config() -> GolosConfig {
    let mut config = GolosConfig::default();
    config.annotator.kind = AnnotatorKind::Passthrough;
    config
}

fn pipeline_with(model: ToneModel) -> VoicePipeline {
    VoicePipeline::new(config(), Box::new(model), Box::new(PassthroughAnnotator)).unwrap()
}

#[test]
fn generates_mono_pcm16_at_target_rate() {
    let pipeline = pipeline_with(ToneModel::new());
    let (bytes, report) = pipeline
        .generate_voice_with_report("Привет, 2.5 это число", Some("baya"))
        .unwrap();

    let decoded = wav::decode(&bytes).unwrap();
    assert_eq!(decoded.sample_rate(), 48_000);
    assert!(!decoded.is_empty());
    assert!(decoded.peak() <= 1.0);
    assert!(decoded.peak() > 0.9, "peak={}", decoded.peak());

    assert_eq!(report.speaker, "baya");
    assert_eq!(report.chunks, 1);
    assert_eq!(report.sample_rate, 48_000);
    assert!(report.duration_secs > 0.0);
}

#[test]
fn normalized_text_reaches_the_model() {
    let model = ToneModel::new();
    let seen = Arc::clone(&model.seen);
    let pipeline = pipeline_with(model);

    pipeline
        .generate_voice("Смотри https://example.com, там 50% @user", None)
        .unwrap();

    let seen = seen.lock().unwrap();
    let text = request_text(&seen[0]);
    assert!(text.contains("ссылка"));
    assert!(text.contains("пятьдесят процентов"));
    assert!(text.contains("упоминание"));
    assert!(!text.contains("http"));
    assert!(!text.chars().any(|c| c.is_ascii_digit()));
    assert_eq!(seen[0].sample_rate, Some(MODEL_RATE));
}

#[test]
fn unknown_speaker_falls_back_to_first_voice() {
    let model = ToneModel::new();
    let seen = Arc::clone(&model.seen);
    let pipeline = pipeline_with(model);

    let (_, report) = pipeline
        .generate_voice_with_report("Привет", Some("nonexistent"))
        .unwrap();
    assert_eq!(report.speaker, "aidar");
    assert_eq!(seen.lock().unwrap()[0].speaker.as_deref(), Some("aidar"));
}

#[test]
fn configured_default_speaker_is_the_fallback() {
    let mut config = config();
    config.model.default_speaker = Some("xenia".into());
    let pipeline =
        VoicePipeline::new(config, Box::new(ToneModel::new()), Box::new(PassthroughAnnotator))
            .unwrap();

    let (_, report) = pipeline.generate_voice_with_report("Привет", None).unwrap();
    assert_eq!(report.speaker, "xenia");
    assert_eq!(pipeline.voices(), vec!["aidar", "baya", "xenia"]);
}

#[test]
fn whitespace_input_fails_before_the_model_is_called() {
    let model = ToneModel::new();
    let seen = Arc::clone(&model.seen);
    let pipeline = pipeline_with(model);

    let err = pipeline.generate_voice("   \n\t ", None).unwrap_err();
    assert!(matches!(err, SpeechError::EmptyInput(_)));
    assert!(seen.lock().unwrap().is_empty());
}

#[test]
fn long_text_is_chunked_and_every_chunk_is_synthesized() {
    let model = ToneModel::new();
    let seen = Arc::clone(&model.seen);
    let pipeline = pipeline_with(model);

    let sentence = "Это довольно длинное предложение для проверки разбиения.";
    let text = vec![sentence; 12].join(" ");
    let (_, report) = pipeline.generate_voice_with_report(&text, None).unwrap();

    let seen = seen.lock().unwrap();
    assert!(report.chunks > 1);
    assert_eq!(seen.len(), report.chunks);
    for request in seen.iter() {
        assert!(request_text(request).chars().count() <= 220);
    }
}

#[test]
fn failing_chunk_fails_the_utterance_with_its_index() {
    // 161 chars fit the first chunk; the last sentence spills into chunk 1.
    let first = vec!["Первое предложение звучит нормально и занимает место."; 3].join(" ");
    let text = format!("{first} А вот это предложение ломается.");
    let mut config = config();
    config.text.max_chunk_chars = 170;

    let mut model = ToneModel::new();
    model.silent_on = Some("ломается");
    let pipeline =
        VoicePipeline::new(config, Box::new(model), Box::new(PassthroughAnnotator)).unwrap();

    match pipeline.generate_voice(&text, None) {
        Err(SpeechError::Synthesis { chunk_index, .. }) => assert_eq!(chunk_index, 1),
        other => panic!("expected synthesis error, got {other:?}"),
    }
}

#[test]
fn stereo_list_output_is_accepted() {
    let mut model = ToneModel::new();
    model.stereo_list = true;
    model.params = vec!["texts", "speaker"];
    let seen = Arc::clone(&model.seen);
    let pipeline = pipeline_with(model);

    let bytes = pipeline.generate_voice("Привет мир", None).unwrap();
    assert!(!wav::decode(&bytes).unwrap().is_empty());
    assert!(matches!(seen.lock().unwrap()[0].text, TextInput::Batch(_)));
}

#[test]
fn annotation_is_applied_before_chunking() {
    let model = ToneModel::new();
    let seen = Arc::clone(&model.seen);
    let pipeline =
        VoicePipeline::new(config(), Box::new(model), Box::new(MarkingAnnotator)).unwrap();

    pipeline.generate_voice("замок на двери", None).unwrap();
    assert_eq!(request_text(&seen.lock().unwrap()[0]), "+замок +на +двери");
}

#[test]
fn empty_annotation_is_an_error() {
    let pipeline =
        VoicePipeline::new(config(), Box::new(ToneModel::new()), Box::new(EmptyAnnotator))
            .unwrap();
    assert!(matches!(
        pipeline.generate_voice("текст", None),
        Err(SpeechError::Annotation(_))
    ));
}

#[test]
fn markup_skips_annotation_and_chunking() {
    let model = ToneModel::new();
    let seen = Arc::clone(&model.seen);
    let pipeline =
        VoicePipeline::new(config(), Box::new(model), Box::new(MarkingAnnotator)).unwrap();

    let markup = format!("<speak>{}</speak>", "слово ".repeat(60));
    let chunks = pipeline.prepare(&markup).unwrap();
    assert_eq!(chunks.len(), 1);

    pipeline.generate_voice(&markup, None).unwrap();
    let text = request_text(&seen.lock().unwrap()[0]);
    assert!(text.starts_with("<speak>"));
    assert!(!text.contains('+'));
}

#[test]
fn invalid_config_is_rejected() {
    let mut config = config();
    config.audio.target_sample_rate = 0;
    assert!(matches!(
        VoicePipeline::new(config, Box::new(ToneModel::new()), Box::new(PassthroughAnnotator)),
        Err(SpeechError::Config(_))
    ));
}

#[test]
fn writes_wav_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("nested").join("hello.wav");
    let pipeline = pipeline_with(ToneModel::new());

    let written = pipeline
        .generate_voice_to_file("Привет", Some("baya"), &path)
        .unwrap();
    assert_eq!(written, path);
    let decoded = wav::decode(&std::fs::read(&path).unwrap()).unwrap();
    assert_eq!(decoded.sample_rate(), 48_000);
}

#[test]
fn shutdown_pipeline_refuses_work() {
    let pipeline = pipeline_with(ToneModel::new());
    pipeline.shutdown();
    assert!(pipeline.generate_voice("Привет", None).is_err());
}

fn assert_send_sync<T: Send + Sync>() {}

#[test]
fn pipeline_is_send_and_sync() {
    assert_send_sync::<VoicePipeline>();
}

#[test]
fn concurrent_callers_share_one_pipeline() {
    let model = ToneModel::new();
    let seen = Arc::clone(&model.seen);
    let pipeline = pipeline_with(model);

    let (first, second) = std::thread::scope(|scope| {
        let a = scope.spawn(|| pipeline.generate_voice("Привет", Some("aidar")));
        let b = scope.spawn(|| pipeline.generate_voice("Добрый день", Some("xenia")));
        (a.join().unwrap(), b.join().unwrap())
    });

    let first = wav::decode(&first.unwrap()).unwrap();
    let second = wav::decode(&second.unwrap()).unwrap();
    assert!(!first.is_empty());
    assert!(second.len() > first.len());

    let mut speakers: Vec<String> = seen
        .lock()
        .unwrap()
        .iter()
        .filter_map(|r| r.speaker.clone())
        .collect();
    speakers.sort();
    assert_eq!(speakers, vec!["aidar".to_owned(), "xenia".to_owned()]);
}

#[tokio::test]
async fn timeout_wrapper_returns_bytes_in_time() {
    let pipeline = Arc::new(pipeline_with(ToneModel::new()));
    let bytes = pipeline
        .generate_voice_with_timeout("Привет".into(), None, Duration::from_secs(30))
        .await
        .unwrap();
    assert_eq!(&bytes[0..4], b"RIFF");
}

#[tokio::test]
async fn timeout_wrapper_gives_up_on_slow_model() {
    let mut model = ToneModel::new();
    model.delay = Duration::from_millis(500);
    let pipeline = Arc::new(pipeline_with(model));

    let err = pipeline
        .generate_voice_with_timeout("Привет".into(), None, Duration::from_millis(20))
        .await
        .unwrap_err();
    assert!(matches!(err, SpeechError::Timeout(_)));
}
