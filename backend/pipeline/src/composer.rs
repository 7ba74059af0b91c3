//! Response Composer
//!
//! Runs the face, OCR and description stages for one inbound image and sends
//! each stage's message as soon as it is ready. Stages are independent: an
//! empty result skips a stage, a failure is logged and recorded, and the
//! following stages still run.

use std::collections::HashMap;

use image::RgbImage;
use lensbridge_core::{
    BridgeError, BridgeResult, FlexCard, IdentifiedFace, ImageEvent, OutboundMessage, Stage,
};
use lensbridge_logging::{EventLogger, PipelineEvent};
use lensbridge_media::{decode_rgb, AnnotationRenderer, StagingArea, StagingScope};
use lensbridge_understanding::{
    collect_ocr_lines, format_descriptions, identified_face, read_text, PollPolicy,
};
use tracing::{debug, info, warn};

use crate::services::Services;

#[derive(Debug, Clone)]
pub struct ComposerSettings {
    /// Face service person group that identification runs against.
    pub person_group_id: String,
    pub poll: PollPolicy,
}

/// What happened to one inbound image.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EmissionReport {
    /// Sent messages, in send order.
    pub emitted: Vec<(Stage, OutboundMessage)>,
    pub skipped: Vec<Stage>,
    pub failed: Vec<Stage>,
}

pub struct ResponseComposer {
    services: Services,
    renderer: AnnotationRenderer,
    staging: StagingArea,
    settings: ComposerSettings,
}

/// The source image as every stage sees it.
struct SourceImage {
    raster: RgbImage,
    url: String,
}

impl ResponseComposer {
    pub fn new(
        services: Services,
        renderer: AnnotationRenderer,
        staging: StagingArea,
        settings: ComposerSettings,
    ) -> Self {
        Self { services, renderer, staging, settings }
    }

    /// Process one image event end to end.
    ///
    /// Errors only when the source image itself cannot be fetched, decoded or
    /// uploaded. Stage failures are reported in the returned [`EmissionReport`].
    /// Staged files are removed before this returns, in every case.
    pub async fn process(&self, event: &ImageEvent) -> BridgeResult<EmissionReport> {
        let message_id = event.message_id.as_str();
        self.staging.ensure().await?;
        let mut scope = self.staging.scope(message_id)?;

        let source = self.prepare_source(message_id, &mut scope).await?;
        info!(message_id, url = %source.url, "Source image uploaded");

        let mut report = EmissionReport::default();
        for stage in [Stage::Face, Stage::Ocr, Stage::Description] {
            let outcome = match stage {
                Stage::Face => self.face_stage(&source, &mut scope).await,
                Stage::Ocr => self.ocr_stage(&source, &mut scope).await,
                Stage::Description => self.description_stage(&source).await,
            };
            let outcome = match outcome {
                Ok(Some(message)) => match self.emit(event, report.emitted.len(), &message).await {
                    Ok(()) => Ok(Some(message)),
                    Err(e) => Err(e),
                },
                other => other,
            };

            match outcome {
                Ok(Some(message)) => {
                    EventLogger::log_event(
                        message_id,
                        PipelineEvent::StageEmitted { stage, url: hero_url(&message).to_string() },
                    );
                    report.emitted.push((stage, message));
                }
                Ok(None) => {
                    EventLogger::log_event(message_id, PipelineEvent::StageSkipped { stage });
                    report.skipped.push(stage);
                }
                Err(e) => {
                    EventLogger::log_event(
                        message_id,
                        PipelineEvent::StageFailed { stage, error: e.to_string() },
                    );
                    report.failed.push(stage);
                }
            }
        }

        info!(
            message_id,
            emitted = report.emitted.len(),
            failed = report.failed.len(),
            "Image processed"
        );
        Ok(report)
    }

    async fn prepare_source(
        &self,
        message_id: &str,
        scope: &mut StagingScope,
    ) -> BridgeResult<SourceImage> {
        let bytes = self.services.content.fetch_content(message_id).await?;
        let path = scope.write_source(&bytes).await?;
        let raster = decode_rgb(&bytes)?;
        let url = self.services.host.upload(&path).await?;
        Ok(SourceImage { raster, url })
    }

    async fn face_stage(
        &self,
        source: &SourceImage,
        scope: &mut StagingScope,
    ) -> BridgeResult<Option<OutboundMessage>> {
        let faces = self.identify_faces(&source.url).await?;
        if faces.is_empty() {
            return Ok(None);
        }
        let annotated = self.renderer.annotate_faces(&source.raster, &faces);
        let path = scope.write_variant("face", &annotated)?;
        let url = self.services.host.upload(&path).await?;
        Ok(Some(OutboundMessage::Image { url }))
    }

    /// Detect, identify and name every face in detection order.
    async fn identify_faces(&self, image_url: &str) -> BridgeResult<Vec<IdentifiedFace>> {
        let group = self.settings.person_group_id.as_str();
        let detected = self.services.faces.detect(image_url).await?;
        if detected.is_empty() {
            return Ok(Vec::new());
        }

        let face_ids: Vec<String> = detected.iter().map(|f| f.face_id.clone()).collect();
        let identifications = self.services.faces.identify(&face_ids, group).await?;

        let mut names: HashMap<String, String> = HashMap::new();
        for top in identifications.iter().filter_map(|i| i.candidates.first()) {
            if names.contains_key(&top.person_id) {
                continue;
            }
            match self.services.faces.person_name(group, &top.person_id).await {
                Ok(name) => {
                    names.insert(top.person_id.clone(), name);
                }
                // The label falls back to the person id.
                Err(e) => warn!(person_id = %top.person_id, error = %e, "Person name lookup failed"),
            }
        }

        let faces = detected
            .iter()
            .map(|face| {
                let candidates = identifications
                    .iter()
                    .find(|i| i.face_id == face.face_id)
                    .map(|i| i.candidates.as_slice())
                    .unwrap_or_default();
                identified_face(face.region, candidates, &names)
            })
            .collect::<Vec<_>>();
        debug!(faces = faces.len(), named = names.len(), "Faces identified");
        Ok(faces)
    }

    async fn ocr_stage(
        &self,
        source: &SourceImage,
        scope: &mut StagingScope,
    ) -> BridgeResult<Option<OutboundMessage>> {
        let regions =
            read_text(self.services.reader.as_ref(), &source.url, &self.settings.poll).await?;
        let ocr = collect_ocr_lines(&regions);
        if ocr.is_empty() {
            return Ok(None);
        }
        let annotated = self.renderer.annotate_text_lines(&source.raster, &ocr.lines);
        let path = scope.write_variant("ocr", &annotated)?;
        let url = self.services.host.upload(&path).await?;
        Ok(Some(OutboundMessage::Flex(FlexCard::with_hero(url, ocr.text))))
    }

    async fn description_stage(&self, source: &SourceImage) -> BridgeResult<Option<OutboundMessage>> {
        let captions = self.services.describer.describe(&source.url).await?;
        if captions.is_empty() {
            return Ok(None);
        }
        Ok(Some(OutboundMessage::Flex(FlexCard::with_hero(
            source.url.clone(),
            format_descriptions(&captions),
        ))))
    }

    async fn emit(
        &self,
        event: &ImageEvent,
        index: usize,
        message: &OutboundMessage,
    ) -> BridgeResult<()> {
        let delivery = event.delivery_for(index).ok_or_else(|| {
            BridgeError::Other(anyhow::anyhow!(
                "message {} has neither reply token nor user id",
                event.message_id
            ))
        })?;
        self.services.messenger.send(&delivery, message).await
    }
}

fn hero_url(message: &OutboundMessage) -> &str {
    match message {
        OutboundMessage::Image { url } => url,
        OutboundMessage::Flex(card) => &card.hero_image_url,
    }
}
