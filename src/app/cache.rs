use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime};

use image::imageops::FilterType;
use image::{DynamicImage, GenericImageView};
use reqwest::blocking::Client;
use tracing::{debug, warn};

pub const RESIZE_MAX_W: u32 = 320;
pub const RESIZE_QUALITY: u8 = 75;

const POSTER_RETENTION_DAYS: u64 = 14;
pub const POSTER_RETENTION: Duration = Duration::from_secs(POSTER_RETENTION_DAYS * 24 * 60 * 60);

pub fn url_to_cache_key(url: &str) -> String {
    format!("{:x}", md5::compute(url.as_bytes()))
}

/// Poster files under `<cache_dir>/posters`, one `<md5(url)>.jpg` per image.
#[derive(Clone, Debug)]
pub struct PosterCache {
    dir: PathBuf,
}

impl PosterCache {
    /// Create the directory and drop anything past the retention window.
    pub fn open(cache_root: &Path) -> Self {
        let mut dir = cache_root.join("posters");
        if let Err(e) = fs::create_dir_all(&dir) {
            warn!("failed to create poster cache dir {}: {e}", dir.display());
            dir = cache_root.to_path_buf();
            let _ = fs::create_dir_all(&dir);
        }
        match prune_older_than(&dir, POSTER_RETENTION) {
            Ok(0) => {}
            Ok(n) => debug!("pruned {n} stale posters"),
            Err(e) => warn!("poster cache prune failed: {e}"),
        }
        Self { dir }
    }

    pub fn path_for(&self, url: &str) -> PathBuf {
        self.dir.join(format!("{}.jpg", url_to_cache_key(url)))
    }

    pub fn find(&self, url: &str) -> Option<PathBuf> {
        let p = self.path_for(url);
        p.exists().then_some(p)
    }

    /// Download with the shared client, shrink, and store as JPEG.
    /// Returns the cached path straight away when it is already on disk.
    pub fn fetch_with_client(&self, client: &Client, url: &str) -> Result<PathBuf, String> {
        if let Some(hit) = self.find(url) {
            return Ok(hit);
        }
        let bytes = client
            .get(url)
            .send()
            .and_then(|r| r.error_for_status())
            .and_then(|r| r.bytes())
            .map_err(|e| format!("download {url}: {e}"))?;

        let jpeg = resize_to_jpeg(&bytes, RESIZE_MAX_W, RESIZE_QUALITY)?;
        let dest = self.path_for(url);
        write_atomic(&dest, &jpeg)?;
        Ok(dest)
    }
}

/// Decode, scale down to `max_width` keeping aspect, and encode as JPEG.
pub fn resize_to_jpeg(bytes: &[u8], max_width: u32, quality: u8) -> Result<Vec<u8>, String> {
    let img = image::load_from_memory(bytes).map_err(|e| format!("decode: {e}"))?;
    let (w, h) = img.dimensions();
    let out: DynamicImage = if w > max_width {
        let new_h = ((h as f32) * (max_width as f32 / w as f32))
            .round()
            .max(1.0) as u32;
        img.resize_exact(max_width, new_h, FilterType::CatmullRom)
    } else {
        img
    };

    // JPEG has no alpha channel
    let rgb = DynamicImage::ImageRgb8(out.to_rgb8());
    let mut jpeg_bytes: Vec<u8> = Vec::new();
    image::codecs::jpeg::JpegEncoder::new_with_quality(&mut jpeg_bytes, quality)
        .encode_image(&rgb)
        .map_err(|e| format!("jpeg encode: {e}"))?;
    Ok(jpeg_bytes)
}

fn write_atomic(dest: &Path, bytes: &[u8]) -> Result<(), String> {
    if let Some(parent) = dest.parent() {
        let _ = fs::create_dir_all(parent);
    }
    let tmp = dest.with_extension("jpg.part");
    {
        let mut f = fs::File::create(&tmp).map_err(|e| format!("create tmp: {e}"))?;
        f.write_all(bytes).map_err(|e| format!("write: {e}"))?;
    }
    fs::rename(&tmp, dest).map_err(|e| format!("rename: {e}"))
}

/// Remove cached images (and leftover `.part` files) last modified before `now - max_age`.
pub fn prune_older_than(dir: &Path, max_age: Duration) -> std::io::Result<usize> {
    let cutoff = SystemTime::now()
        .checked_sub(max_age)
        .unwrap_or(SystemTime::UNIX_EPOCH);
    let mut removed = 0usize;
    for entry in fs::read_dir(dir)? {
        let entry = entry?;
        if !entry.file_type()?.is_file() {
            continue;
        }
        let path = entry.path();
        let Some(ext) = path
            .extension()
            .and_then(|e| e.to_str())
            .map(|s| s.to_ascii_lowercase())
        else {
            continue;
        };
        if !matches!(ext.as_str(), "png" | "jpg" | "jpeg" | "webp" | "part") {
            continue;
        }
        let modified = entry
            .metadata()?
            .modified()
            .unwrap_or(SystemTime::UNIX_EPOCH);
        if modified < cutoff && fs::remove_file(&path).is_ok() {
            removed += 1;
        }
    }
    Ok(removed)
}

/// (width, height, RGBA8) for a cached image file.
pub fn load_rgba(path: &Path) -> Result<(u32, u32, Vec<u8>), String> {
    let img = image::ImageReader::open(path)
        .map_err(|e| format!("open image {}: {e}", path.display()))?
        .with_guessed_format()
        .map_err(|e| format!("guess format {}: {e}", path.display()))?
        .decode()
        .map_err(|e| format!("decode {}: {e}", path.display()))?;
    let (w, h) = img.dimensions();
    Ok((w, h, img.to_rgba8().into_raw()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{ImageFormat, RgbaImage};

    fn png_bytes(w: u32, h: u32) -> Vec<u8> {
        let img = DynamicImage::ImageRgba8(RgbaImage::from_pixel(w, h, image::Rgba([200, 40, 40, 255])));
        let mut out = Vec::new();
        img.write_to(&mut std::io::Cursor::new(&mut out), ImageFormat::Png)
            .unwrap();
        out
    }

    #[test]
    fn cache_key_is_md5_of_url() {
        assert_eq!(url_to_cache_key(""), "d41d8cd98f00b204e9800998ecf8427e");
        assert_ne!(url_to_cache_key("a"), url_to_cache_key("b"));
    }

    #[test]
    fn large_images_are_scaled_to_max_width() {
        let jpeg = resize_to_jpeg(&png_bytes(640, 960), RESIZE_MAX_W, RESIZE_QUALITY).unwrap();
        let img = image::load_from_memory(&jpeg).unwrap();
        assert_eq!(img.dimensions(), (320, 480));
    }

    #[test]
    fn small_images_keep_their_size() {
        let jpeg = resize_to_jpeg(&png_bytes(100, 150), RESIZE_MAX_W, RESIZE_QUALITY).unwrap();
        assert_eq!(image::load_from_memory(&jpeg).unwrap().dimensions(), (100, 150));
    }

    #[test]
    fn garbage_bytes_fail_to_decode() {
        assert!(resize_to_jpeg(b"<html>404</html>", RESIZE_MAX_W, RESIZE_QUALITY).is_err());
    }

    #[test]
    fn cached_file_is_found_and_loaded() {
        let tmp = tempfile::tempdir().unwrap();
        let cache = PosterCache::open(tmp.path());
        let url = "https://image.tmdb.org/t/p/w500/x.jpg";
        assert!(cache.find(url).is_none());

        let jpeg = resize_to_jpeg(&png_bytes(40, 60), RESIZE_MAX_W, RESIZE_QUALITY).unwrap();
        write_atomic(&cache.path_for(url), &jpeg).unwrap();

        let path = cache.find(url).unwrap();
        assert!(path.starts_with(tmp.path().join("posters")));
        let (w, h, rgba) = load_rgba(&path).unwrap();
        assert_eq!((w, h), (40, 60));
        assert_eq!(rgba.len(), 40 * 60 * 4);
    }

    #[test]
    fn prune_removes_only_aged_images() {
        let tmp = tempfile::tempdir().unwrap();
        fs::write(tmp.path().join("old.jpg"), b"x").unwrap();
        fs::write(tmp.path().join("notes.txt"), b"x").unwrap();

        assert_eq!(prune_older_than(tmp.path(), POSTER_RETENTION).unwrap(), 0);

        std::thread::sleep(Duration::from_millis(1100));
        assert_eq!(prune_older_than(tmp.path(), Duration::from_millis(500)).unwrap(), 1);
        assert!(!tmp.path().join("old.jpg").exists());
        assert!(tmp.path().join("notes.txt").exists());
    }
}
