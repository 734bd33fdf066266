use qrcode::render::{svg, unicode};
use qrcode::{EcLevel, QrCode};
use std::fmt;

/// A scannable QR code for a payment URI.
pub(crate) struct QrImage {
    code: QrCode,
}

impl fmt::Debug for QrImage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("QrImage")
            .field("version", &self.code.version())
            .field("width", &self.code.width())
            .finish()
    }
}

impl QrImage {
    pub(crate) fn encode(data: &str) -> Result<Self, qrcode::types::QrError> {
        let code = QrCode::with_error_correction_level(data.as_bytes(), EcLevel::M)?;
        Ok(Self { code })
    }

    /// Modules per side, excluding the quiet zone.
    pub(crate) fn width(&self) -> usize {
        self.code.width()
    }

    pub(crate) fn to_svg(&self) -> String {
        self.code
            .render::<svg::Color<'_>>()
            .min_dimensions(300, 300)
            .dark_color(svg::Color("#000000"))
            .light_color(svg::Color("#ffffff"))
            .quiet_zone(true)
            .build()
    }

    /// Half-block rendering, two modules per character row.
    pub(crate) fn to_terminal(&self) -> String {
        self.code
            .render::<unicode::Dense1x2>()
            .dark_color(unicode::Dense1x2::Light)
            .light_color(unicode::Dense1x2::Dark)
            .quiet_zone(true)
            .build()
    }
}
