use crate::structure::Bitmap;
use byteorder::{LittleEndian, WriteBytesExt};
use cgmath::Point2;
use std::error::Error;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

pub const DEFAULT_GAMMA: f32 = 2.2;

/// Save the image, the format is selected from the file extension
pub fn save(imgout_path_str: &str, img: &Bitmap) -> Result<(), Box<dyn Error>> {
    let output_ext = Path::new(imgout_path_str)
        .extension()
        .and_then(std::ffi::OsStr::to_str)
        .ok_or_else(|| format!("No file extension provided: {}", imgout_path_str))?;
    match output_ext {
        "ppm" => save_ppm(imgout_path_str, img, DEFAULT_GAMMA),
        "pfm" => save_pfm(imgout_path_str, img),
        #[cfg(feature = "image")]
        "png" => save_png(imgout_path_str, img),
        _ => Err(format!("Unknown output file extension: {}", output_ext).into()),
    }
}

fn to_byte(c: f32, gamma: f32) -> u8 {
    let mut c = c.max(0.0);
    if gamma > 0.0 {
        c = c.powf(1.0 / gamma);
    }
    (c.min(1.0) * 255.0).round() as u8
}

/// Binary PPM (P6), rows from top to bottom.
/// No gamma correction is done when `gamma <= 0`.
pub fn encode_ppm<W: Write>(out: &mut W, img: &Bitmap, gamma: f32) -> std::io::Result<()> {
    write!(out, "P6\n{} {}\n255\n", img.size.x, img.size.y)?;
    for c in &img.colors {
        out.write_all(&[to_byte(c.r, gamma), to_byte(c.g, gamma), to_byte(c.b, gamma)])?;
    }
    out.flush()
}

pub fn save_ppm(imgout_path_str: &str, img: &Bitmap, gamma: f32) -> Result<(), Box<dyn Error>> {
    let mut file = BufWriter::new(File::create(Path::new(imgout_path_str))?);
    encode_ppm(&mut file, img, gamma)?;
    Ok(())
}

pub fn save_pfm(imgout_path_str: &str, img: &Bitmap) -> Result<(), Box<dyn Error>> {
    let mut file = BufWriter::new(File::create(Path::new(imgout_path_str))?);
    let header = format!("PF\n{} {}\n-1.0\n", img.size.x, img.size.y);
    file.write_all(header.as_bytes())?;
    // Rows from bottom to top
    for y in 0..img.size.y {
        for x in 0..img.size.x {
            let p = img.pixel(Point2::new(x, img.size.y - y - 1));
            file.write_f32::<LittleEndian>(p.r.abs())?;
            file.write_f32::<LittleEndian>(p.g.abs())?;
            file.write_f32::<LittleEndian>(p.b.abs())?;
        }
    }
    file.flush()?;
    Ok(())
}

#[cfg(feature = "image")]
pub fn save_png(imgout_path_str: &str, img: &Bitmap) -> Result<(), Box<dyn Error>> {
    let mut image_ldr = image::RgbImage::new(img.size.x, img.size.y);
    for (x, y, pixel) in image_ldr.enumerate_pixels_mut() {
        let c = img.pixel(Point2::new(x, y));
        *pixel = image::Rgb([
            to_byte(c.r, DEFAULT_GAMMA),
            to_byte(c.g, DEFAULT_GAMMA),
            to_byte(c.b, DEFAULT_GAMMA),
        ]);
    }
    image_ldr.save(imgout_path_str)?;
    Ok(())
}
