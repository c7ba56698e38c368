//! Named canvas sizes and backgrounds commonly used for headshots and social media.

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SizePreset {
    pub label: &'static str,
    pub width: u32,
    pub height: u32,
}

/// A background string in the [`crate::background::parse`] grammar.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BackgroundPreset {
    pub label: &'static str,
    pub spec: &'static str,
}

const fn size(label: &'static str, width: u32, height: u32) -> SizePreset {
    SizePreset {
        label,
        width,
        height,
    }
}

pub const SIZE_PRESETS: &[SizePreset] = &[
    size("Headshot (Web)", 500, 500),
    size("Headshot (Thumbnail)", 400, 400),
    size("Headshot (Small)", 300, 300),
    size("Avatar / Icon", 200, 200),
    size("Headshot (High-res)", 800, 800),
    size("Facebook Profile", 170, 170),
    size("Instagram Profile", 320, 320),
    size("X / Twitter Profile", 400, 400),
    size("LinkedIn Profile", 400, 400),
    size("YouTube Profile", 800, 800),
    size("Instagram Post (Square)", 1080, 1080),
    size("Instagram Post (Portrait)", 1080, 1350),
    size("Instagram Post (Landscape)", 1080, 566),
    size("Instagram / TikTok Story", 1080, 1920),
    size("Facebook Post / Link", 1200, 630),
    size("X / Twitter Post", 1200, 675),
    size("LinkedIn Post", 1200, 627),
    size("Pinterest Pin", 1000, 1500),
    size("YouTube Thumbnail", 1280, 720),
    size("Facebook Cover", 820, 312),
    size("X / Twitter Header", 1500, 500),
    size("LinkedIn Banner", 1584, 396),
    size("YouTube Channel Banner", 2560, 1440),
    size("Medium Rectangle (IAB)", 300, 250),
    size("Leaderboard (IAB)", 728, 90),
    size("Wide Skyscraper (IAB)", 160, 600),
    size("Half Page (IAB)", 300, 600),
    size("Mobile Leaderboard (IAB)", 320, 50),
    size("Mobile Interstitial (IAB)", 320, 480),
    size("Billboard (IAB)", 970, 250),
    size("Large Leaderboard (IAB)", 970, 90),
    size("Email Header", 600, 200),
    size("Email Square", 600, 600),
    size("Website Hero Banner", 1200, 400),
    size("Full HD (16:9)", 1920, 1080),
];

pub const BACKGROUND_PRESETS: &[BackgroundPreset] = &[
    BackgroundPreset {
        label: "White",
        spec: "#FFFFFF",
    },
    BackgroundPreset {
        label: "Light Gray",
        spec: "#E0E0E0",
    },
    BackgroundPreset {
        label: "Professional Gray",
        spec: "#D0D0D0",
    },
    BackgroundPreset {
        label: "Corporate Blue Gradient",
        spec: "#4A7AB5:#E8EEF5",
    },
    BackgroundPreset {
        label: "NACE Brand Gradient",
        spec: "#1D4BB7:#DFE7EF",
    },
    BackgroundPreset {
        label: "NACE Full Gradient",
        spec: "#1D4BB7:#DFE7EF:#1D4BB7",
    },
    BackgroundPreset {
        label: "ONA Teal",
        spec: "#49A3A1",
    },
    BackgroundPreset {
        label: "ONA Summit Gradient",
        spec: "#49A3A1:#FFFFFF",
    },
    BackgroundPreset {
        label: "Transparent (PNG or WebP)",
        spec: "TRANSPARENT",
    },
];
