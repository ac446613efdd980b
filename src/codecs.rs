//! Codec registry inspection
//!
//! Walks FFmpeg's registered codecs and splits them into encoder/decoder
//! and software/hardware buckets. A codec counts as hardware accelerated
//! when its name contains one of the known accelerator names.

use crate::error::{Error, Result};

use ffmpeg_next as ffmpeg;
use ffmpeg_next::ffi;
use std::str::FromStr;

/// Hardware accelerators recognised by name
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HwAccel {
    /// NVIDIA/Unix VDPAU
    Vdpau,
    /// Windows DirectX Video Acceleration 2
    Dxva2,
    /// Legacy Apple Video Decode Acceleration
    Vda,
    /// Apple VideoToolbox
    VideoToolbox,
    /// Intel QuickSync
    Qsv,
    /// Intel/AMD VA-API
    Vaapi,
    /// NVIDIA CUVID (NVDEC)
    Cuvid,
}

impl HwAccel {
    /// All accelerators, in the order they are checked
    pub const ALL: [HwAccel; 7] = [
        HwAccel::Vdpau,
        HwAccel::Dxva2,
        HwAccel::Vda,
        HwAccel::VideoToolbox,
        HwAccel::Qsv,
        HwAccel::Vaapi,
        HwAccel::Cuvid,
    ];

    /// Name as it appears inside FFmpeg codec names
    pub fn name(&self) -> &'static str {
        match self {
            HwAccel::Vdpau => "vdpau",
            HwAccel::Dxva2 => "dxva2",
            HwAccel::Vda => "vda",
            HwAccel::VideoToolbox => "videotoolbox",
            HwAccel::Qsv => "qsv",
            HwAccel::Vaapi => "vaapi",
            HwAccel::Cuvid => "cuvid",
        }
    }

    /// FFmpeg hwdevice type name, `None` when FFmpeg has no device for it
    pub fn device_type_name(&self) -> Option<&'static str> {
        match self {
            HwAccel::Vdpau => Some("vdpau"),
            HwAccel::Dxva2 => Some("dxva2"),
            HwAccel::Vda => None,
            HwAccel::VideoToolbox => Some("videotoolbox"),
            HwAccel::Qsv => Some("qsv"),
            HwAccel::Vaapi => Some("vaapi"),
            HwAccel::Cuvid => Some("cuda"),
        }
    }
}

impl std::fmt::Display for HwAccel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

impl FromStr for HwAccel {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let lower = s.trim().to_lowercase();
        HwAccel::ALL
            .into_iter()
            .find(|accel| accel.name() == lower)
            .ok_or_else(|| Error::UnknownHwAccel(s.to_string()))
    }
}

/// Whether a registry entry encodes or decodes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CodecKind {
    Encoder,
    Decoder,
}

/// A registered codec
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CodecInfo {
    pub name: String,
    pub kind: CodecKind,
}

impl CodecInfo {
    pub fn new(name: impl Into<String>, kind: CodecKind) -> Self {
        Self {
            name: name.into(),
            kind,
        }
    }

    pub fn is_hardware(&self) -> bool {
        is_hw_accelerated(&self.name)
    }
}

/// Check a codec name against the accelerator names
pub fn is_hw_accelerated(codec_name: &str) -> bool {
    HwAccel::ALL
        .iter()
        .any(|accel| codec_name.contains(accel.name()))
}

/// Every codec in FFmpeg's registry, in registration order
pub fn list_codecs() -> Result<Vec<CodecInfo>> {
    ffmpeg::init().map_err(|e| Error::Ffmpeg(e.to_string()))?;

    let mut codecs = Vec::new();
    let mut opaque = std::ptr::null_mut();

    loop {
        // SAFETY: av_codec_iterate walks a static table; the returned pointers
        // stay valid for the life of the process.
        let codec = unsafe {
            let ptr = ffi::av_codec_iterate(&mut opaque);
            if ptr.is_null() {
                break;
            }
            ffmpeg::Codec::wrap(ptr as *mut ffi::AVCodec)
        };

        let kind = if codec.is_encoder() {
            CodecKind::Encoder
        } else {
            CodecKind::Decoder
        };
        codecs.push(CodecInfo::new(codec.name(), kind));
    }

    tracing::debug!("Enumerated {} registered codecs", codecs.len());

    Ok(codecs)
}

/// Keep codecs of one kind whose hardware flag matches, preserving order
pub fn filter_codecs(codecs: &[CodecInfo], kind: CodecKind, hardware: bool) -> Vec<&str> {
    codecs
        .iter()
        .filter(|c| c.kind == kind && c.is_hardware() == hardware)
        .map(|c| c.name.as_str())
        .collect()
}

/// Accelerators that have at least one decoder, in discovery order
pub fn detect_hwaccels(codecs: &[CodecInfo]) -> Vec<HwAccel> {
    let mut remaining: Vec<HwAccel> = HwAccel::ALL.to_vec();
    let mut found = Vec::new();

    for codec in codecs {
        if remaining.is_empty() {
            break;
        }
        if codec.kind == CodecKind::Encoder {
            continue;
        }

        if let Some(pos) = remaining
            .iter()
            .position(|accel| codec.name.contains(accel.name()))
        {
            found.push(remaining.remove(pos));
        }
    }

    found
}

/// Render a listing: one name per line, or "(none)"
pub fn format_listing<S: AsRef<str>>(names: &[S]) -> String {
    if names.is_empty() {
        return "(none)".to_string();
    }
    names
        .iter()
        .map(|n| n.as_ref())
        .collect::<Vec<_>>()
        .join("\n")
}
