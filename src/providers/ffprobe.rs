use async_trait::async_trait;
use serde::Deserialize;
use tokio::process::Command;

use super::{
    FetchRequest, MediaType, Metadata, MetadataProvider, ProviderError, ProviderId,
    ProviderOptions, TemplateVariable, vars,
};

#[derive(Debug, Deserialize)]
struct FfprobeOutput {
    #[serde(default)]
    streams: Vec<FfprobeStream>,
}

#[derive(Debug, Deserialize)]
struct FfprobeStream {
    codec_type: String,
    codec_name: Option<String>,
    height: Option<u32>,
    color_transfer: Option<String>,
    #[serde(default)]
    side_data_list: Vec<FfprobeSideData>,
}

#[derive(Debug, Deserialize)]
struct FfprobeSideData {
    side_data_type: Option<String>,
}

/// Technical metadata from the media file itself.
#[derive(Debug, Default)]
pub struct FfprobeProvider;

impl FfprobeProvider {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl MetadataProvider for FfprobeProvider {
    fn id(&self) -> ProviderId {
        ProviderId::FFProbe
    }

    fn configure(&mut self, _options: ProviderOptions) -> Result<(), ProviderError> {
        Ok(())
    }

    async fn fetch(&self, request: &FetchRequest) -> Result<Metadata, ProviderError> {
        let path = request
            .path
            .as_ref()
            .ok_or(ProviderError::Unsupported(ProviderId::FFProbe))?;

        let output = Command::new("ffprobe")
            .args(["-v", "quiet", "-print_format", "json", "-show_streams"])
            .arg(path)
            .output()
            .await
            .map_err(|e| ProviderError::Probe(format!("could not run ffprobe: {e}")))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(ProviderError::Probe(stderr.trim().to_string()));
        }

        let parsed: FfprobeOutput = serde_json::from_slice(&output.stdout)?;
        Ok(streams_to_metadata(parsed))
    }

    fn supported_variables(&self, media_type: MediaType) -> Vec<TemplateVariable> {
        match media_type {
            MediaType::Episode | MediaType::Movie => vars(&[
                ("resolution", "Vertical resolution class", "1080p"),
                ("video_codec", "Video codec", "h264"),
                ("audio_codec", "Audio codec of the first track", "aac"),
                ("hdr", "Dynamic range", "SDR"),
            ]),
            MediaType::Show | MediaType::Season => Vec::new(),
        }
    }
}

fn streams_to_metadata(output: FfprobeOutput) -> Metadata {
    let mut metadata = Metadata::new();

    if let Some(video) = output.streams.iter().find(|s| s.codec_type == "video") {
        if let Some(codec) = &video.codec_name {
            metadata.insert("video_codec", codec);
        }
        if let Some(height) = video.height {
            metadata.insert("resolution", resolution_class(height));
        }

        let dolby_vision = video
            .side_data_list
            .iter()
            .any(|sd| sd.side_data_type.as_deref() == Some("DOVI configuration record"));
        let hdr = match video.color_transfer.as_deref() {
            _ if dolby_vision => "DV",
            Some("smpte2084") => "HDR10",
            Some("arib-std-b67") => "HLG",
            _ => "SDR",
        };
        metadata.insert("hdr", hdr);
    }

    if let Some(codec) = output
        .streams
        .iter()
        .find(|s| s.codec_type == "audio")
        .and_then(|s| s.codec_name.as_ref())
    {
        metadata.insert("audio_codec", codec);
    }

    metadata
}

fn resolution_class(height: u32) -> &'static str {
    match height {
        h if h >= 2000 => "2160p",
        h if h >= 1000 => "1080p",
        h if h >= 700 => "720p",
        h if h >= 560 => "576p",
        _ => "480p",
    }
}
