// Copyright 2026 @lucent

use crate::math::constants::Float;

use exr::prelude::write_rgb_file;

// Write EXR Image to file
pub fn write_exr_to_file(image: &[(Float, Float, Float)],
                         width: usize,
                         height: usize,
                         file_path: &str) -> Result<(), String> {
    log::info!("Starting writing openexr image: {}.", file_path);

    if image.len() != width * height {
        return Err(format!(
            "EXR write: {} pixels do not fill {}x{}",
            image.len(), width, height
        ));
    }

    write_rgb_file(file_path, width, height, |x, y| {
        (
            image[y * width + x].0,
            image[y * width + x].1,
            image[y * width + x].2,
        )
    })
    .map_err(|e| format!("EXR write error: {}", e))?;

    log::info!("EXR written to: {}.", file_path);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_size_mismatch_rejected() {
        let pixels = vec![(0.0, 0.0, 0.0); 3];
        assert!(write_exr_to_file(&pixels, 2, 2, "/tmp/never-written.exr").is_err());
    }
}
