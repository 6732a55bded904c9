//! Texture format enumeration and the format classifiers in §6.
//!
//! The variant set and `format_has_stencil` are taken verbatim from
//! `original_source/gfx/src/util/Utils.cpp` (`resultToString`'s sibling
//! switch, `getFormatBytesPerPixel`, and the `hasStencil` helper duplicated
//! in `original_source/gfx/src/backend/webgpu/core/Entities.cpp`) so the
//! three depth/stencil formats that carry a stencil aspect match the
//! original byte-for-byte.

/// Closed set of supported texture formats (§6).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TextureFormat {
    R8Unorm,
    R8G8Unorm,
    R8G8B8A8Unorm,
    R8G8B8A8UnormSrgb,
    B8G8R8A8Unorm,
    B8G8R8A8UnormSrgb,
    R16Float,
    Rg16Float,
    Rgba16Float,
    R32Float,
    Rg32Float,
    Rgba32Float,
    Depth16Unorm,
    Depth24Plus,
    Depth32Float,
    Depth24PlusStencil8,
    Depth32FloatStencil8,
    Stencil8,
}

/// P5: true iff `fmt` carries a stencil aspect.
pub fn format_has_stencil(fmt: TextureFormat) -> bool {
    matches!(
        fmt,
        TextureFormat::Depth24PlusStencil8
            | TextureFormat::Depth32FloatStencil8
            | TextureFormat::Stencil8
    )
}

/// True for the two formats with a depth aspect (plus the combined
/// depth-stencil formats, which carry both).
pub fn format_has_depth(fmt: TextureFormat) -> bool {
    matches!(
        fmt,
        TextureFormat::Depth16Unorm
            | TextureFormat::Depth24Plus
            | TextureFormat::Depth32Float
            | TextureFormat::Depth24PlusStencil8
            | TextureFormat::Depth32FloatStencil8
    )
}

/// Bytes occupied by one texel of `fmt`, mirroring
/// `Utils.cpp::getFormatBytesPerPixel`. Depth/stencil formats are reported
/// using their native packed storage size.
pub fn format_bytes_per_pixel(fmt: TextureFormat) -> u32 {
    match fmt {
        TextureFormat::R8Unorm | TextureFormat::Stencil8 => 1,
        TextureFormat::R8G8Unorm | TextureFormat::Depth16Unorm | TextureFormat::R16Float => 2,
        TextureFormat::R8G8B8A8Unorm
        | TextureFormat::R8G8B8A8UnormSrgb
        | TextureFormat::B8G8R8A8Unorm
        | TextureFormat::B8G8R8A8UnormSrgb
        | TextureFormat::Depth24Plus
        | TextureFormat::Depth32Float
        | TextureFormat::Depth24PlusStencil8
        | TextureFormat::Rg16Float
        | TextureFormat::R32Float => 4,
        TextureFormat::Depth32FloatStencil8 => 5,
        TextureFormat::Rgba16Float | TextureFormat::Rg32Float => 8,
        TextureFormat::Rgba32Float => 16,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_the_three_named_formats_have_stencil() {
        for fmt in [
            TextureFormat::R8Unorm,
            TextureFormat::R8G8Unorm,
            TextureFormat::R8G8B8A8Unorm,
            TextureFormat::R8G8B8A8UnormSrgb,
            TextureFormat::B8G8R8A8Unorm,
            TextureFormat::B8G8R8A8UnormSrgb,
            TextureFormat::R16Float,
            TextureFormat::Rg16Float,
            TextureFormat::Rgba16Float,
            TextureFormat::R32Float,
            TextureFormat::Rg32Float,
            TextureFormat::Rgba32Float,
            TextureFormat::Depth16Unorm,
            TextureFormat::Depth24Plus,
            TextureFormat::Depth32Float,
        ] {
            assert!(!format_has_stencil(fmt), "{fmt:?} should not have stencil");
        }
        for fmt in [
            TextureFormat::Depth24PlusStencil8,
            TextureFormat::Depth32FloatStencil8,
            TextureFormat::Stencil8,
        ] {
            assert!(format_has_stencil(fmt), "{fmt:?} should have stencil");
        }
    }
}
