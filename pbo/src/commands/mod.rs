pub mod pack;
pub mod unpack;
pub mod verify;

pub use pack::run as pack;
pub use unpack::run as unpack;
pub use verify::run as verify;

use pbo_format::{HeaderEntry, Progress};

#[inline(always)]
fn format_size(len: u64) -> String {
    use humansize::{file_size_opts as options, FileSize};

    len.file_size(options::BINARY)
        .unwrap_or_else(|_| format!("{} B", len))
}

#[inline(always)]
fn format_time(timestamp: u32) -> String {
    let datetime: chrono::DateTime<chrono::Utc> =
        pbo_format::fs::timestamp_to_system_time(timestamp).into();
    datetime.to_rfc3339_opts(chrono::SecondsFormat::Secs, true)
}

fn describe(entry: &HeaderEntry) -> String {
    let mut out = format!(
        "{} ({}, {}",
        entry.filename,
        format_size(entry.packed_size()),
        format_time(entry.timestamp)
    );
    if entry.is_compressed() {
        out.push_str(", compressed");
    }
    out.push(')');
    out
}

/// Prints one line per progress event, for `--verbose` and `--dryrun`.
pub(crate) fn print_progress(progress: Progress<'_>) {
    match progress {
        Progress::Started {
            total_files,
            total_bytes,
        } => println!("{} files, {}", total_files, format_size(total_bytes)),
        Progress::Packing { entry, .. } => println!("  packing: {} ...", describe(entry)),
        Progress::Unpacking { entry, .. } => println!("  unpacking: {} ...", describe(entry)),
        Progress::Skipped { name, error } => println!("  skipped: {} ({})", name, error),
        Progress::Finished => {}
    }
}
