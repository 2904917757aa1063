//! Builders for run output archives.

use flate2::write::GzEncoder;
use flate2::Compression;
use tar::{Builder, EntryType, Header};

/// Build a `.tar.gz` holding `files` under a top-level `{root_dir}/`,
/// the layout the pipeline uses for run outputs.
///
/// File names may contain `/` to place files in subdirectories.
pub fn build_output_archive(root_dir: &str, files: &[(&str, &[u8])]) -> Vec<u8> {
    build_archive_with_links(root_dir, files, &[])
}

/// Like [`build_output_archive`], plus symlink entries given as
/// `(name, target)` pairs.
pub fn build_archive_with_links(
    root_dir: &str,
    files: &[(&str, &[u8])],
    links: &[(&str, &str)],
) -> Vec<u8> {
    let encoder = GzEncoder::new(Vec::new(), Compression::default());
    let mut builder = Builder::new(encoder);

    for (name, data) in files {
        let mut header = Header::new_gnu();
        header.set_entry_type(EntryType::Regular);
        header.set_size(data.len() as u64);
        header.set_mode(0o644);
        builder
            .append_data(&mut header, format!("{}/{}", root_dir, name), *data)
            .expect("append archive entry");
    }

    for (name, target) in links {
        let mut header = Header::new_gnu();
        header.set_entry_type(EntryType::Symlink);
        header.set_size(0);
        header.set_mode(0o777);
        builder
            .append_link(&mut header, format!("{}/{}", root_dir, name), *target)
            .expect("append archive link");
    }

    builder
        .into_inner()
        .and_then(|encoder| encoder.finish())
        .expect("finish archive")
}

const PNG_MAGIC: &[u8; 8] = b"\x89PNG\r\n\x1a\n";

/// Files of a typical run output.
pub fn sample_output_files() -> Vec<(&'static str, &'static [u8])> {
    vec![
        ("output.json", &b"{\"run_id\": \"run\"}"[..]),
        ("summary.json", &b"{}"[..]),
        ("images/legend.png", &PNG_MAGIC[..]),
        ("images/hourly/100m/smoke_2020011401.png", &PNG_MAGIC[..]),
        ("data/smoke_dispersion.nc", &b"CDF\x01"[..]),
    ]
}
