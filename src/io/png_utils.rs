// Copyright 2026 @lucent

// Write an RGBA8 image to a PNG file
pub fn write_png_to_file(pixels: &[[u8; 4]],
                         width: u32,
                         height: u32,
                         file_path: &str) -> Result<(), String> {
    log::info!("Starting writing png image: {}.", file_path);

    if pixels.len() != (width * height) as usize {
        return Err(format!(
            "PNG write: {} pixels do not fill {}x{}",
            pixels.len(), width, height
        ));
    }

    let mut bytes = Vec::with_capacity(pixels.len() * 4);
    for px in pixels {
        bytes.extend_from_slice(px);
    }

    image::save_buffer(file_path, &bytes, width, height, image::ColorType::Rgba8)
        .map_err(|e| format!("PNG write error: {}", e))?;

    log::info!("PNG written to: {}.", file_path);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_size_mismatch_rejected() {
        let pixels = vec![[0u8; 4]; 3];
        assert!(write_png_to_file(&pixels, 2, 2, "/tmp/never-written.png").is_err());
    }
}
