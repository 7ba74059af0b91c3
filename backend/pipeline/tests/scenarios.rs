use std::collections::HashMap;
use std::io::Cursor;
use std::path::Path;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use image::{ImageFormat, Rgb, RgbImage};
use lensbridge_core::{
    BridgeError, BridgeResult, Candidate, Caption, ChatMessenger, ContentSource, DetectedFace,
    Delivery, FaceAnalyzer, FaceIdentification, FaceRegion, ImageDescriber, ImageEvent, ImageHost,
    OutboundMessage, ReadJob, ReadProgress, ReadStatus, Stage, TextLine, TextReader, TextRegion,
};
use lensbridge_media::{AnnotationRenderer, StagingArea};
use lensbridge_pipeline::{spawn_worker, ComposerSettings, ResponseComposer, Services};
use lensbridge_understanding::PollPolicy;
use tempfile::TempDir;

struct PngSource;

#[async_trait]
impl ContentSource for PngSource {
    async fn fetch_content(&self, _message_id: &str) -> BridgeResult<Vec<u8>> {
        let image = RgbImage::from_pixel(160, 120, Rgb([255, 255, 255]));
        let mut bytes = Cursor::new(Vec::new());
        image
            .write_to(&mut bytes, ImageFormat::Png)
            .map_err(|e| BridgeError::Image(e.to_string()))?;
        Ok(bytes.into_inner())
    }
}

#[derive(Default)]
struct RecordingMessenger {
    sent: Mutex<Vec<(Delivery, OutboundMessage)>>,
}

#[async_trait]
impl ChatMessenger for RecordingMessenger {
    async fn send(&self, delivery: &Delivery, message: &OutboundMessage) -> BridgeResult<()> {
        self.sent.lock().unwrap().push((delivery.clone(), message.clone()));
        Ok(())
    }
}

/// Serves `https://i.example/<file name>`; optionally fails for one file.
/// Keeps a decoded copy of every face annotation it receives.
#[derive(Default)]
struct FakeHost {
    uploads: Mutex<Vec<String>>,
    face_images: Mutex<Vec<RgbImage>>,
    fail_for: Option<&'static str>,
}

#[async_trait]
impl ImageHost for FakeHost {
    async fn upload(&self, path: &Path) -> BridgeResult<String> {
        assert!(path.exists(), "uploaded file must be staged: {}", path.display());
        let name = path.file_name().unwrap().to_string_lossy().to_string();
        if self.fail_for.is_some_and(|f| name.contains(f)) {
            return Err(BridgeError::upstream("imgur", "503 Service Unavailable"));
        }
        if name.contains("_face") {
            let decoded = image::open(path).map_err(|e| BridgeError::Image(e.to_string()))?;
            self.face_images.lock().unwrap().push(decoded.to_rgb8());
        }
        self.uploads.lock().unwrap().push(name.clone());
        Ok(format!("https://i.example/{name}"))
    }
}

#[derive(Default)]
struct FakeFaces {
    faces: Vec<DetectedFace>,
    identifications: Vec<FaceIdentification>,
    names: HashMap<String, String>,
    name_lookups: Mutex<u32>,
}

#[async_trait]
impl FaceAnalyzer for FakeFaces {
    async fn detect(&self, _image_url: &str) -> BridgeResult<Vec<DetectedFace>> {
        Ok(self.faces.clone())
    }

    async fn identify(
        &self,
        face_ids: &[String],
        group_id: &str,
    ) -> BridgeResult<Vec<FaceIdentification>> {
        assert_eq!(group_id, "friends");
        assert_eq!(face_ids.len(), self.faces.len());
        Ok(self.identifications.clone())
    }

    async fn person_name(&self, _group_id: &str, person_id: &str) -> BridgeResult<String> {
        *self.name_lookups.lock().unwrap() += 1;
        self.names
            .get(person_id)
            .cloned()
            .ok_or_else(|| BridgeError::upstream("azure-face", "404 person not found"))
    }
}

enum ReaderMode {
    Lines(Vec<&'static str>),
    Outage,
    NeverFinishes,
}

struct FakeReader(ReaderMode);

#[async_trait]
impl TextReader for FakeReader {
    async fn submit_read(&self, _image_url: &str) -> BridgeResult<ReadJob> {
        match self.0 {
            ReaderMode::Outage => Err(BridgeError::upstream("azure-read", "500 Internal Server Error")),
            _ => Ok(ReadJob("https://cv.example/operations/1".into())),
        }
    }

    async fn poll_status(&self, _job: &ReadJob) -> BridgeResult<ReadProgress> {
        match &self.0 {
            ReaderMode::Lines(texts) => Ok(ReadProgress {
                status: ReadStatus::Succeeded,
                regions: vec![TextRegion {
                    lines: texts
                        .iter()
                        .enumerate()
                        .map(|(i, t)| {
                            let y = 5.0 + 20.0 * i as f32;
                            TextLine {
                                polygon: [(5.0, y), (50.0, y), (50.0, y + 10.0), (5.0, y + 10.0)],
                                text: t.to_string(),
                            }
                        })
                        .collect(),
                }],
            }),
            _ => Ok(ReadProgress::pending(ReadStatus::Running)),
        }
    }
}

struct FakeDescriber(Vec<Caption>);

#[async_trait]
impl ImageDescriber for FakeDescriber {
    async fn describe(&self, _image_url: &str) -> BridgeResult<Vec<Caption>> {
        Ok(self.0.clone())
    }
}

struct Harness {
    composer: ResponseComposer,
    messenger: Arc<RecordingMessenger>,
    host: Arc<FakeHost>,
    faces: Arc<FakeFaces>,
    staging: TempDir,
}

fn harness(faces: FakeFaces, reader: ReaderMode, captions: Vec<Caption>, host: FakeHost) -> Harness {
    let staging = TempDir::new().unwrap();
    let messenger = Arc::new(RecordingMessenger::default());
    let host = Arc::new(host);
    let faces = Arc::new(faces);
    let services = Services {
        content: Arc::new(PngSource),
        messenger: messenger.clone(),
        host: host.clone(),
        faces: faces.clone(),
        reader: Arc::new(FakeReader(reader)),
        describer: Arc::new(FakeDescriber(captions)),
    };
    let settings = ComposerSettings {
        person_group_id: "friends".into(),
        poll: PollPolicy {
            initial_delay: Duration::from_millis(1),
            max_delay: Duration::from_millis(2),
            multiplier: 2,
            max_attempts: 3,
            timeout: Duration::from_secs(5),
        },
    };
    let composer = ResponseComposer::new(
        services,
        AnnotationRenderer::default(),
        StagingArea::new(staging.path()),
        settings,
    );
    Harness { composer, messenger, host, faces, staging }
}

fn event() -> ImageEvent {
    ImageEvent {
        message_id: "100".into(),
        reply_token: Some("reply-1".into()),
        user_id: Some("U1".into()),
    }
}

fn one_face(candidates: Vec<Candidate>) -> FakeFaces {
    FakeFaces {
        faces: vec![DetectedFace { face_id: "f1".into(), region: FaceRegion::new(20, 30, 20, 20) }],
        identifications: vec![FaceIdentification { face_id: "f1".into(), candidates }],
        ..FakeFaces::default()
    }
}

fn staged_files(h: &Harness) -> usize {
    std::fs::read_dir(h.staging.path()).unwrap().count()
}

/// JPEG-tolerant color checks.
fn is_red(p: &Rgb<u8>) -> bool {
    p[0] > 180 && p[1] < 90 && p[2] < 90
}

fn is_white(p: &Rgb<u8>) -> bool {
    p.0.iter().all(|c| *c > 200)
}

#[tokio::test]
async fn unknown_face_yields_single_image_message() {
    let h = harness(one_face(vec![]), ReaderMode::Lines(vec![]), vec![], FakeHost::default());

    let report = h.composer.process(&event()).await.unwrap();

    assert_eq!(
        report.emitted,
        vec![(Stage::Face, OutboundMessage::Image { url: "https://i.example/100_face.jpg".into() })]
    );
    assert_eq!(report.skipped, vec![Stage::Ocr, Stage::Description]);
    assert!(report.failed.is_empty());
    assert_eq!(*h.faces.name_lookups.lock().unwrap(), 0);

    let sent = h.messenger.sent.lock().unwrap();
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].0, Delivery::Reply { token: "reply-1".into() });

    // Face at (20, 30) 20x20. "unknown" gets a 12 px strip, 12 * 7 = 84 px
    // wide, directly above the box.
    let images = h.host.face_images.lock().unwrap();
    assert_eq!(images.len(), 1);
    let annotated = &images[0];
    assert_eq!(annotated.dimensions(), (160, 120));
    for x in [50, 60, 90] {
        assert!(is_red(annotated.get_pixel(x, 24)), "strip pixel at x={x}");
    }
    assert!(is_white(annotated.get_pixel(120, 24)), "strip ends at x=104");
    assert!(is_white(annotated.get_pixel(10, 24)), "strip starts at x=20");
    assert!(is_white(annotated.get_pixel(60, 10)), "strip is 12 px tall");
    // 3 px outline along the bottom edge of the box.
    assert!(annotated.get_pixel(30, 49)[1] < 200, "bottom outline is drawn");
}

#[tokio::test]
async fn ocr_only_image_yields_single_flex_card() {
    let h = harness(
        FakeFaces::default(),
        ReaderMode::Lines(vec!["Invoice", "Total: 100"]),
        vec![],
        FakeHost::default(),
    );

    let report = h.composer.process(&event()).await.unwrap();

    assert_eq!(report.emitted.len(), 1);
    let (stage, message) = &report.emitted[0];
    assert_eq!(*stage, Stage::Ocr);
    match message {
        OutboundMessage::Flex(card) => {
            assert_eq!(card.body_text, "Invoice\nTotal: 100");
            assert_eq!(card.hero_image_url, "https://i.example/100_ocr.jpg");
            assert_eq!(card.hero_link_url, card.hero_image_url);
        }
        other => panic!("expected flex card, got {other:?}"),
    }
}

#[tokio::test]
async fn all_stages_emit_in_order_reply_then_push() {
    let mut faces = one_face(vec![Candidate { person_id: "p1".into(), confidence: 0.87 }]);
    faces.names.insert("p1".into(), "Alice".into());
    let h = harness(
        faces,
        ReaderMode::Lines(vec!["Hello"]),
        vec![Caption { text: "a woman smiling".into(), confidence: 0.91 }],
        FakeHost::default(),
    );

    let report = h.composer.process(&event()).await.unwrap();

    let stages: Vec<Stage> = report.emitted.iter().map(|(s, _)| *s).collect();
    assert_eq!(stages, vec![Stage::Face, Stage::Ocr, Stage::Description]);
    assert_eq!(*h.faces.name_lookups.lock().unwrap(), 1);

    match &report.emitted[2].1 {
        OutboundMessage::Flex(card) => {
            assert_eq!(card.hero_image_url, "https://i.example/100.png");
            assert_eq!(card.body_text, "'a woman smiling' with confidence 91.00%\n");
        }
        other => panic!("expected flex card, got {other:?}"),
    }

    let deliveries: Vec<Delivery> =
        h.messenger.sent.lock().unwrap().iter().map(|(d, _)| d.clone()).collect();
    assert_eq!(
        deliveries,
        vec![
            Delivery::Reply { token: "reply-1".into() },
            Delivery::Push { to: "U1".into() },
            Delivery::Push { to: "U1".into() },
        ]
    );
    assert_eq!(
        *h.host.uploads.lock().unwrap(),
        vec!["100.png", "100_face.jpg", "100_ocr.jpg"]
    );
}

#[tokio::test]
async fn ocr_outage_does_not_block_face_or_description() {
    let h = harness(
        one_face(vec![]),
        ReaderMode::Outage,
        vec![Caption { text: "a dog".into(), confidence: 0.5 }],
        FakeHost::default(),
    );

    let report = h.composer.process(&event()).await.unwrap();

    assert_eq!(report.failed, vec![Stage::Ocr]);
    let stages: Vec<Stage> = report.emitted.iter().map(|(s, _)| *s).collect();
    assert_eq!(stages, vec![Stage::Face, Stage::Description]);
    assert_eq!(h.messenger.sent.lock().unwrap().len(), 2);
}

#[tokio::test]
async fn endless_read_job_fails_only_the_ocr_stage() {
    let h = harness(
        FakeFaces::default(),
        ReaderMode::NeverFinishes,
        vec![Caption { text: "a receipt".into(), confidence: 0.7 }],
        FakeHost::default(),
    );

    let report = h.composer.process(&event()).await.unwrap();

    assert_eq!(report.failed, vec![Stage::Ocr]);
    assert_eq!(report.emitted.len(), 1);
    assert_eq!(report.emitted[0].0, Stage::Description);
}

#[tokio::test]
async fn failed_annotated_upload_fails_only_that_stage() {
    let h = harness(
        one_face(vec![]),
        ReaderMode::Lines(vec!["Exit"]),
        vec![],
        FakeHost { fail_for: Some("_face"), ..FakeHost::default() },
    );

    let report = h.composer.process(&event()).await.unwrap();

    assert_eq!(report.failed, vec![Stage::Face]);
    assert_eq!(report.emitted.len(), 1);
    // The OCR card is the first message actually sent, so it gets the reply token.
    assert_eq!(h.messenger.sent.lock().unwrap()[0].0, Delivery::Reply { token: "reply-1".into() });
    // The face variant was staged before its upload failed.
    assert_eq!(staged_files(&h), 0);
}

#[tokio::test]
async fn nothing_found_sends_nothing() {
    let h = harness(FakeFaces::default(), ReaderMode::Lines(vec![]), vec![], FakeHost::default());

    let report = h.composer.process(&event()).await.unwrap();

    assert!(report.emitted.is_empty());
    assert_eq!(report.skipped, vec![Stage::Face, Stage::Ocr, Stage::Description]);
    assert!(h.messenger.sent.lock().unwrap().is_empty());
}

#[tokio::test]
async fn unknown_person_name_falls_back_to_id() {
    let h = harness(
        one_face(vec![Candidate { person_id: "p-404".into(), confidence: 0.6 }]),
        ReaderMode::Lines(vec![]),
        vec![],
        FakeHost::default(),
    );

    let report = h.composer.process(&event()).await.unwrap();

    assert!(report.failed.is_empty());
    assert_eq!(report.emitted.len(), 1);
}

#[tokio::test]
async fn staged_files_are_removed_after_success() {
    let mut faces = one_face(vec![Candidate { person_id: "p1".into(), confidence: 0.87 }]);
    faces.names.insert("p1".into(), "Alice".into());
    let h = harness(faces, ReaderMode::Lines(vec!["Hi"]), vec![], FakeHost::default());

    h.composer.process(&event()).await.unwrap();

    assert_eq!(staged_files(&h), 0);
}

#[tokio::test]
async fn source_upload_failure_aborts_and_cleans_up() {
    let h = harness(
        one_face(vec![]),
        ReaderMode::Lines(vec!["Hi"]),
        vec![],
        FakeHost { fail_for: Some("100.png"), ..FakeHost::default() },
    );

    let err = h.composer.process(&event()).await.unwrap_err();

    assert!(matches!(err, BridgeError::Upstream { .. }));
    assert!(h.messenger.sent.lock().unwrap().is_empty());
    assert_eq!(staged_files(&h), 0);
}

#[tokio::test]
async fn event_without_recipient_records_failures() {
    let h = harness(
        FakeFaces::default(),
        ReaderMode::Lines(vec![]),
        vec![Caption { text: "a tree".into(), confidence: 0.8 }],
        FakeHost::default(),
    );
    let orphan = ImageEvent { message_id: "101".into(), reply_token: None, user_id: None };

    let report = h.composer.process(&orphan).await.unwrap();

    assert_eq!(report.failed, vec![Stage::Description]);
    assert!(h.messenger.sent.lock().unwrap().is_empty());
}

#[tokio::test]
async fn worker_processes_queued_events_in_order() {
    let h = harness(
        FakeFaces::default(),
        ReaderMode::Lines(vec![]),
        vec![Caption { text: "a cat".into(), confidence: 0.5 }],
        FakeHost::default(),
    );
    let messenger = h.messenger.clone();
    let (tx, handle) = spawn_worker(Arc::new(h.composer), 4);

    for (id, token) in [("200", "t-200"), ("201", "t-201")] {
        tx.send(ImageEvent {
            message_id: id.into(),
            reply_token: Some(token.into()),
            user_id: Some("U1".into()),
        })
        .await
        .unwrap();
    }
    drop(tx);
    handle.await.unwrap();

    let sent = messenger.sent.lock().unwrap();
    let tokens: Vec<Delivery> = sent.iter().map(|(d, _)| d.clone()).collect();
    assert_eq!(
        tokens,
        vec![Delivery::Reply { token: "t-200".into() }, Delivery::Reply { token: "t-201".into() }]
    );
    match &sent[1].1 {
        OutboundMessage::Flex(card) => assert_eq!(card.hero_image_url, "https://i.example/201.png"),
        other => panic!("expected flex card, got {other:?}"),
    }
}
