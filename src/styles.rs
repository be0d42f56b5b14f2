//! Built-in style presets.

use crate::error::StylizerError;

/// A named style and the guidance text sent to the provider.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct StyleDescriptor {
    /// What the user picks
    pub label: &'static str,
    /// Forwarded verbatim to the provider
    pub prompt_text: &'static str,
}

static STYLES: [StyleDescriptor; 4] = [
    StyleDescriptor {
        label: "Cinematic Portrait",
        prompt_text: "A cinematic photography portrait, dramatic lighting, 85mm lens, ultra-clear skin, realistic tones.",
    },
    StyleDescriptor {
        label: "Watercolor Painting",
        prompt_text: "Watercolor fine-art portrait, soft edges, pastel color palette, delicate textures.",
    },
    StyleDescriptor {
        label: "Cyberpunk Neon",
        prompt_text: "Cyberpunk portrait with neon lights, futuristic city glow, high contrast, glowing edges.",
    },
    StyleDescriptor {
        label: "Studio K-Beauty",
        prompt_text: "Korean studio beauty portrait, soft light, minimalistic, clean skin retouching, Vogue style.",
    },
];

/// Every style in display order.
pub fn all() -> &'static [StyleDescriptor] {
    &STYLES
}

/// Returns the guidance text for `label`.
pub fn lookup(label: &str) -> Result<&'static str, StylizerError> {
    let label = label.trim();
    STYLES
        .iter()
        .find(|style| style.label.eq_ignore_ascii_case(label))
        .map(|style| style.prompt_text)
        .ok_or_else(|| StylizerError::UnknownStyle(label.to_string()))
}
