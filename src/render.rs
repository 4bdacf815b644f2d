//! Upload noise maps into Bevy's asset system.

use bevy::{
    asset::{Assets, RenderAssetUsages},
    image::{Image, ImageAddressMode, ImageSampler, ImageSamplerDescriptor},
    prelude::Handle,
    render::render_resource::{Extent3d, TextureDimension, TextureFormat},
};

use crate::{image::greyscale, map::NoiseMap};

/// Upload a [`NoiseMap`] as a linear greyscale RGBA8 image with a full
/// mipmap chain and clamp-to-edge sampling.
///
/// Cells are encoded with [`greyscale`]; alpha is opaque. Empty maps upload
/// as a single black texel, since zero-sized textures are invalid.
pub fn noise_map_to_image(map: &NoiseMap, images: &mut Assets<Image>) -> Handle<Image> {
    images.add(make_image(map))
}

/// Expand a noise map into RGBA8 bytes, row-major.
pub fn noise_map_to_rgba(map: &NoiseMap) -> Vec<u8> {
    map.values()
        .iter()
        .flat_map(|&v| {
            let g = greyscale(v);
            [g, g, g, 255]
        })
        .collect()
}

fn make_image(map: &NoiseMap) -> Image {
    let (width, height, data) = if map.values().is_empty() {
        (1, 1, vec![0, 0, 0, 255])
    } else {
        (
            u32::from(map.width()),
            u32::from(map.height()),
            noise_map_to_rgba(map),
        )
    };

    let mut image = Image::new(
        Extent3d {
            width,
            height,
            depth_or_array_layers: 1,
        },
        TextureDimension::D2,
        data,
        TextureFormat::Rgba8Unorm,
        RenderAssetUsages::default(),
    );
    if let Some(base_data) = image.data.take() {
        let (mip_data, mip_level_count) = generate_mipmaps(base_data, width, height);
        image.texture_descriptor.mip_level_count = mip_level_count;
        image.data = Some(mip_data);
    }
    image.sampler = ImageSampler::Descriptor(ImageSamplerDescriptor {
        address_mode_u: ImageAddressMode::ClampToEdge,
        address_mode_v: ImageAddressMode::ClampToEdge,
        mag_filter: bevy::image::ImageFilterMode::Linear,
        min_filter: bevy::image::ImageFilterMode::Linear,
        mipmap_filter: bevy::image::ImageFilterMode::Linear,
        ..Default::default()
    });
    image
}

/// Append successively halved levels to `data` with a 2×2 box filter.
///
/// Odd dimensions clamp the source block to the image boundary. Returns the
/// expanded buffer and the mip level count including level 0.
fn generate_mipmaps(mut data: Vec<u8>, base_width: u32, base_height: u32) -> (Vec<u8>, u32) {
    let mut mip_level_count = 1u32;
    let mut current_width = base_width as usize;
    let mut current_height = base_height as usize;
    let mut prev_offset = 0usize;

    while current_width > 1 || current_height > 1 {
        let next_width = current_width.max(2) / 2;
        let next_height = current_height.max(2) / 2;
        let next_offset = data.len();

        data.resize(next_offset + next_width * next_height * 4, 0);

        for y in 0..next_height {
            for x in 0..next_width {
                let mut sum = [0u32; 4];
                let mut count = 0u32;
                for sy in (y * 2)..(y * 2 + 2).min(current_height) {
                    for sx in (x * 2)..(x * 2 + 2).min(current_width) {
                        let src = prev_offset + (sy * current_width + sx) * 4;
                        for (acc, &byte) in sum.iter_mut().zip(&data[src..src + 4]) {
                            *acc += u32::from(byte);
                        }
                        count += 1;
                    }
                }
                let dst = next_offset + (y * next_width + x) * 4;
                for (i, acc) in sum.into_iter().enumerate() {
                    data[dst + i] = (acc / count) as u8;
                }
            }
        }

        prev_offset = next_offset;
        current_width = next_width;
        current_height = next_height;
        mip_level_count += 1;
    }

    (data, mip_level_count)
}
