// SPDX-License-Identifier: MIT
//! Coded enumerations used across the catalog
//!
//! Every enumeration keeps an `Unknown(code)` variant so codes added by
//! newer producers survive decoding and print as `Unknown N`.

use std::cmp::Ordering;
use std::fmt;

use serde::{Serialize, Serializer};

macro_rules! coded_enum {
    (
        $(#[$meta:meta])*
        pub enum $name:ident($repr:ty) {
            $($variant:ident = $code:literal => $label:literal,)+
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        pub enum $name {
            $($variant,)+
            Unknown($repr),
        }

        impl $name {
            pub fn from_code(code: $repr) -> Self {
                match code {
                    $($code => Self::$variant,)+
                    other => Self::Unknown(other),
                }
            }

            pub fn code(self) -> $repr {
                match self {
                    $(Self::$variant => $code,)+
                    Self::Unknown(code) => code,
                }
            }

            pub fn is_unknown(self) -> bool {
                matches!(self, Self::Unknown(_))
            }
        }

        impl From<$repr> for $name {
            fn from(code: $repr) -> Self {
                Self::from_code(code)
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                match self {
                    $(Self::$variant => f.write_str($label),)+
                    Self::Unknown(code) => write!(f, "Unknown {}", code),
                }
            }
        }

        impl PartialOrd for $name {
            fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
                Some(self.cmp(other))
            }
        }

        impl Ord for $name {
            fn cmp(&self, other: &Self) -> Ordering {
                self.code().cmp(&other.code())
            }
        }

        impl Serialize for $name {
            fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
                serializer.serialize_str(&self.to_string())
            }
        }
    };
}

coded_enum! {
    /// Dimension of a rendition key
    pub enum RenditionAttributeType(u32) {
        ThemeLook = 0 => "Theme Look",
        Element = 1 => "Element",
        Part = 2 => "Part",
        Size = 3 => "Size",
        Direction = 4 => "Direction",
        Placeholder = 5 => "placeholder",
        Value = 6 => "Value",
        ThemeAppearance = 7 => "Theme Appearance",
        Dimension1 = 8 => "Dimension 1",
        Dimension2 = 9 => "Dimension 2",
        State = 10 => "State",
        Layer = 11 => "Layer",
        Scale = 12 => "Scale",
        PresentationState = 14 => "Presentation State",
        Idiom = 15 => "Idiom",
        Subtype = 16 => "Subtype",
        Identifier = 17 => "Identifier",
        PreviousValue = 18 => "Previous Value",
        PreviousState = 19 => "Previous State",
        HorizontalSizeClass = 20 => "Horizontal Size Class",
        VerticalSizeClass = 21 => "Vertical Size Class",
        MemoryLevelClass = 22 => "Memory Level Class",
        GraphicsFeatureSetClass = 23 => "Graphics Feature Set Class",
        DisplayGamut = 24 => "Display Gamut",
        DeploymentTarget = 25 => "Deployment Target",
    }
}

coded_enum! {
    /// Pixel payload codec, as named by CoreUI
    pub enum CompressionType(u32) {
        Uncompressed = 0 => "uncompressed",
        Rle = 1 => "rle",
        Zip = 2 => "zip",
        Lzvn = 3 => "lzvn",
        Lzfse = 4 => "lzfse",
        JpegLzfse = 5 => "jpeg-lzfse",
        Blurred = 6 => "blurred",
        Astc = 7 => "astc",
        PaletteImg = 8 => "palette-img",
        DeepmapLzfse = 9 => "deepmap-lzfse",
        Deepmap2 = 11 => "deepmap-2",
    }
}

coded_enum! {
    /// Payload shape of a rendition, consulted when the pixel format is zero
    pub enum LayoutType(u16) {
        TextEffect = 0x007 => "TextEffect",
        Vector = 0x009 => "Vector",
        Data = 0x3E8 => "Data",
        ExternalLink = 0x3E9 => "ExternalLink",
        LayerStack = 0x3EA => "LayerStack",
        InternalReference = 0x3EB => "InternalReference",
        PackedImage = 0x3EC => "PackedImage",
        NameList = 0x3ED => "NameList",
        AddObject = 0x3EE => "AddObject",
        Texture = 0x3EF => "Texture",
        TextureImage = 0x3F0 => "TextureImage",
        Color = 0x3F1 => "Color",
        MultisizeImage = 0x3F2 => "MultisizeImage",
        LayerReference = 0x3F4 => "LayerReference",
        ContentRendition = 0x3F5 => "ContentRendition",
        RecognitionObject = 0x3F6 => "RecognitionObject",
    }
}

coded_enum! {
    /// Device family of a multisize image set entry
    pub enum Idiom(u32) {
        Universal = 0 => "universal",
        Phone = 1 => "phone",
        Pad = 2 => "pad",
        Tv = 3 => "tv",
        Car = 4 => "car",
        Watch = 5 => "watch",
        Marketing = 6 => "marketing",
    }
}

/// Rendition flag bitfield of the CSI header
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct RenditionFlags(pub u32);

impl RenditionFlags {
    #[inline]
    fn bit(self, n: u32) -> bool {
        self.0 & (1 << n) != 0
    }

    pub fn is_header_flagged_fpo(self) -> bool {
        self.bit(0)
    }

    pub fn is_excluded_from_contrast_filter(self) -> bool {
        self.bit(1)
    }

    pub fn is_vector_based(self) -> bool {
        self.bit(2)
    }

    pub fn is_opaque(self) -> bool {
        self.bit(3)
    }

    /// 4-bit bitmap encoding field
    pub fn bitmap_encoding(self) -> u32 {
        (self.0 >> 4) & 0xF
    }

    pub fn opt_out_of_thinning(self) -> bool {
        self.bit(8)
    }

    pub fn is_flippable(self) -> bool {
        self.bit(9)
    }

    pub fn is_tintable(self) -> bool {
        self.bit(10)
    }

    pub fn preserved_vector_representation(self) -> bool {
        self.bit(11)
    }
}

/// Color space word of the CSI header: 4-bit id, 28 reserved bits
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct ColorSpace(pub u32);

impl ColorSpace {
    pub fn id(self) -> u32 {
        self.0 & 0xF
    }
}
