use std::ffi::OsStr;
use std::path::{Path, PathBuf};

use log::{debug, error, info, warn};
use walkdir::WalkDir;

use crate::config::is_http_url;
use crate::error::PosterError;
use crate::file::get_thumbnail_path;
use crate::http::ImageSource;
use crate::metadata::{MovieLookup, MovieRecord};
use crate::parser::parse_file_name;
use crate::thumbnail::Thumbnailer;

/// Extension of the disc images the scanner looks for.
pub const SOURCE_EXTENSION: &str = "iso";

/// A disc image that has no sibling thumbnail yet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScanEntry {
    /// Path relative to the scan root.
    pub relative_path: PathBuf,
    pub source_path: PathBuf,
    pub file_name: String,
    pub thumbnail_path: PathBuf,
}

/// Candidates found by [`find_candidates`] plus the number of walk errors met.
#[derive(Debug, Default)]
pub struct Candidates {
    pub entries: Vec<ScanEntry>,
    pub walk_errors: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    /// The file name carries no recognisable title and year.
    Unparseable,
    /// The metadata record has no usable poster.
    NoPoster,
    /// A thumbnail appeared after the candidate list was built.
    ThumbnailExists,
}

/// Terminal state of one entry.
#[derive(Debug)]
pub enum EntryOutcome {
    Generated,
    Skipped(SkipReason),
    Errored(PosterError),
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct ScanSummary {
    pub candidates: usize,
    pub generated: usize,
    pub skipped: usize,
    pub errors: usize,
}

impl ScanSummary {
    pub fn has_errors(&self) -> bool {
        self.errors > 0
    }

    fn record(&mut self, outcome: &EntryOutcome) {
        match outcome {
            EntryOutcome::Generated => self.generated += 1,
            EntryOutcome::Skipped(_) => self.skipped += 1,
            EntryOutcome::Errored(_) => self.errors += 1,
        }
    }
}

/// Asked for a poster URL by hand when the metadata record has none.
pub trait PosterPrompt {
    /// Returns the URL to use, or `None` to skip the entry.
    fn ask(&self, entry: &ScanEntry, record: &MovieRecord) -> Option<String>;
}

/// Recursively lists `*.iso` files under `root` that lack a sibling `.jpg`.
///
/// Entries are returned in path order. Unreadable directories are logged and
/// counted rather than aborting the walk.
pub fn find_candidates(root: &Path) -> Result<Candidates, PosterError> {
    if !root.is_dir() {
        return Err(PosterError::NotADirectory(root.to_path_buf()));
    }

    info!("Starting scan of {:?}", root);
    let mut candidates = Candidates::default();

    for entry in WalkDir::new(root).sort_by_file_name() {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => {
                warn!("Error walking directory: {}", e);
                candidates.walk_errors += 1;
                continue;
            }
        };

        let path = entry.path();
        if !entry.file_type().is_file() || path.extension() != Some(OsStr::new(SOURCE_EXTENSION)) {
            continue;
        }

        let thumbnail_path = get_thumbnail_path(path);
        if thumbnail_path.exists() {
            debug!("Already has a thumbnail, ignoring {:?}", path);
            continue;
        }

        candidates.entries.push(ScanEntry {
            relative_path: path.strip_prefix(root).unwrap_or(path).to_path_buf(),
            source_path: path.to_path_buf(),
            file_name: entry.file_name().to_string_lossy().into_owned(),
            thumbnail_path,
        });
    }

    info!(
        "Found {} disc images without thumbnails ({} walk errors)",
        candidates.entries.len(),
        candidates.walk_errors
    );
    Ok(candidates)
}

/// Drives the parse, lookup and thumbnail steps for every candidate, one at a time.
pub struct Scanner<'a> {
    lookup: &'a dyn MovieLookup,
    images: &'a dyn ImageSource,
    thumbnailer: &'a Thumbnailer,
    prompt: Option<&'a dyn PosterPrompt>,
}

impl<'a> Scanner<'a> {
    pub fn new(
        lookup: &'a dyn MovieLookup,
        images: &'a dyn ImageSource,
        thumbnailer: &'a Thumbnailer,
    ) -> Self {
        Self {
            lookup,
            images,
            thumbnailer,
            prompt: None,
        }
    }

    /// Ask `prompt` for a URL instead of skipping entries without a poster.
    pub fn with_prompt(mut self, prompt: &'a dyn PosterPrompt) -> Self {
        self.prompt = Some(prompt);
        self
    }

    /// Scans `root` and processes every candidate. Only a bad root is fatal.
    pub fn scan(&self, root: &Path) -> Result<ScanSummary, PosterError> {
        let candidates = find_candidates(root)?;

        let mut summary = ScanSummary {
            candidates: candidates.entries.len(),
            errors: candidates.walk_errors,
            ..Default::default()
        };

        for entry in &candidates.entries {
            let outcome = self.process_entry(entry);
            summary.record(&outcome);
        }

        info!(
            "Scan complete: {} candidates, {} generated, {} skipped, {} errors",
            summary.candidates, summary.generated, summary.skipped, summary.errors
        );
        Ok(summary)
    }

    /// Runs one entry to its terminal state, logging the reason.
    pub fn process_entry(&self, entry: &ScanEntry) -> EntryOutcome {
        let Some(parsed) = parse_file_name(&entry.file_name) else {
            warn!("Cannot parse title and year from {:?}, skipping", entry.relative_path);
            return EntryOutcome::Skipped(SkipReason::Unparseable);
        };

        let record = match self.lookup.lookup(&parsed.title, &parsed.year) {
            Ok(record) => record,
            Err(e) => {
                error!("No movie record found for {:?}: {}", entry.relative_path, e);
                return EntryOutcome::Errored(e);
            }
        };

        let poster = match record.poster_url() {
            Some(url) => url.to_string(),
            None => match self.manual_poster(entry, &record) {
                Some(url) => url,
                None => {
                    warn!(
                        "No poster available for {:?} ({}), skipping",
                        parsed.title, parsed.year
                    );
                    return EntryOutcome::Skipped(SkipReason::NoPoster);
                }
            },
        };

        if entry.thumbnail_path.exists() {
            info!("Thumbnail {:?} appeared during the scan, skipping", entry.thumbnail_path);
            return EntryOutcome::Skipped(SkipReason::ThumbnailExists);
        }

        match self.thumbnailer.generate(self.images, &poster, &entry.thumbnail_path) {
            Ok(()) => {
                info!("Wrote {:?}", entry.thumbnail_path);
                EntryOutcome::Generated
            }
            Err(e) if e.is_thumbnail_exists() => {
                info!("Thumbnail {:?} appeared during the scan, skipping", entry.thumbnail_path);
                EntryOutcome::Skipped(SkipReason::ThumbnailExists)
            }
            Err(e) => {
                error!("Thumbnail generation failed for {:?}: {}", entry.relative_path, e);
                EntryOutcome::Errored(e)
            }
        }
    }

    fn manual_poster(&self, entry: &ScanEntry, record: &MovieRecord) -> Option<String> {
        let answer = self.prompt?.ask(entry, record)?;
        let answer = answer.trim();
        if is_http_url(answer) {
            Some(answer.to_string())
        } else {
            if !answer.is_empty() {
                warn!("Ignoring manual poster {:?}: not an http(s) URL", answer);
            }
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sizes::ThumbnailSize;
    use crate::thumbnail::tests::{StaticImage, png_bytes};
    use std::cell::RefCell;
    use std::collections::HashMap;
    use std::fs;
    use tempfile::{TempDir, tempdir};

    const POSTER: &str = "https://img.example.com/poster.jpg";

    /// In-memory metadata provider. Unknown titles are "not found".
    #[derive(Default)]
    struct FakeLookup {
        records: HashMap<String, MovieRecord>,
        calls: RefCell<Vec<(String, String)>>,
        /// File written during every lookup, to race the final write.
        plant: Option<PathBuf>,
    }

    impl FakeLookup {
        fn with(mut self, title: &str, poster: Option<&str>) -> Self {
            self.records.insert(
                title.to_string(),
                MovieRecord {
                    title: Some(title.to_string()),
                    poster: poster.map(str::to_string),
                    ..Default::default()
                },
            );
            self
        }
    }

    impl MovieLookup for FakeLookup {
        fn lookup(&self, title: &str, year: &str) -> Result<MovieRecord, PosterError> {
            self.calls.borrow_mut().push((title.to_string(), year.to_string()));
            if let Some(path) = &self.plant {
                fs::write(path, b"planted").unwrap();
            }
            self.records
                .get(title)
                .cloned()
                .ok_or_else(|| PosterError::MovieNotFound {
                    title: title.to_string(),
                    year: year.to_string(),
                    reason: "Movie not found!".to_string(),
                })
        }
    }

    struct BrokenImages;

    impl ImageSource for BrokenImages {
        fn fetch(&self, url: &str) -> Result<Vec<u8>, PosterError> {
            Err(PosterError::Io(std::io::Error::new(
                std::io::ErrorKind::ConnectionRefused,
                format!("cannot reach {url}"),
            )))
        }
    }

    struct FixedAnswer(&'static str);

    impl PosterPrompt for FixedAnswer {
        fn ask(&self, _entry: &ScanEntry, _record: &MovieRecord) -> Option<String> {
            Some(self.0.to_string())
        }
    }

    fn root_with(files: &[&str]) -> TempDir {
        let dir = tempdir().expect("Failed to create temporary directory");
        for file in files {
            let path = dir.path().join(file);
            fs::create_dir_all(path.parent().unwrap()).unwrap();
            fs::write(path, b"disc").unwrap();
        }
        dir
    }

    fn thumbnailer() -> Thumbnailer {
        Thumbnailer::new(ThumbnailSize::POSTER, 90)
    }

    #[test]
    fn test_candidates_exclude_processed_and_foreign_files() {
        let root = root_with(&[
            "Alien (1979).iso",
            "Alien (1979).jpg",
            "Heat (1995).iso",
            "Heat (1995).mkv",
            "LOUD (2001).ISO",
            "nested/deeper/Ran (1985).iso",
        ]);

        let candidates = find_candidates(root.path()).unwrap();
        let names: Vec<_> = candidates.entries.iter().map(|e| e.file_name.as_str()).collect();

        assert_eq!(names, vec!["Heat (1995).iso", "Ran (1985).iso"]);
        let ran = &candidates.entries[1];
        assert_eq!(ran.relative_path, PathBuf::from("nested/deeper/Ran (1985).iso"));
        assert_eq!(ran.thumbnail_path, root.path().join("nested/deeper/Ran (1985).jpg"));
        assert_eq!(candidates.walk_errors, 0);
    }

    #[test]
    fn test_processed_entry_is_never_looked_up() {
        let root = root_with(&["Alien (1979).iso", "Alien (1979).jpg"]);
        let lookup = FakeLookup::default().with("Alien", Some(POSTER));
        let images = StaticImage::new(png_bytes(10, 10));
        let thumbnailer = thumbnailer();

        let summary = Scanner::new(&lookup, &images, &thumbnailer)
            .scan(root.path())
            .unwrap();

        assert_eq!(summary, ScanSummary::default());
        assert!(lookup.calls.borrow().is_empty());
        assert_eq!(fs::read(root.path().join("Alien (1979).jpg")).unwrap(), b"disc");
    }

    #[test]
    fn test_generates_missing_thumbnail() {
        let root = root_with(&["sub/Alien (1979).iso"]);
        let lookup = FakeLookup::default().with("Alien", Some(POSTER));
        let images = StaticImage::new(png_bytes(300, 450));
        let thumbnailer = thumbnailer();

        let summary = Scanner::new(&lookup, &images, &thumbnailer)
            .scan(root.path())
            .unwrap();

        assert_eq!(
            summary,
            ScanSummary {
                candidates: 1,
                generated: 1,
                skipped: 0,
                errors: 0
            }
        );
        assert_eq!(
            *lookup.calls.borrow(),
            vec![("Alien".to_string(), "1979".to_string())]
        );
        let thumb = image::open(root.path().join("sub/Alien (1979).jpg")).unwrap();
        assert_eq!((thumb.width(), thumb.height()), (600, 600));
        assert_eq!(fs::read(root.path().join("sub/Alien (1979).iso")).unwrap(), b"disc");
    }

    #[test]
    fn test_unparseable_name_is_skipped_without_error() {
        let root = root_with(&["badname.iso"]);
        let lookup = FakeLookup::default();
        let images = StaticImage::new(png_bytes(10, 10));
        let thumbnailer = thumbnailer();

        let summary = Scanner::new(&lookup, &images, &thumbnailer)
            .scan(root.path())
            .unwrap();

        assert_eq!(summary.skipped, 1);
        assert_eq!(summary.errors, 0);
        assert!(lookup.calls.borrow().is_empty());
    }

    #[test]
    fn test_na_poster_skips_without_download() {
        let root = root_with(&["Alien (1979).iso"]);
        let lookup = FakeLookup::default().with("Alien", Some("N/A"));
        let images = StaticImage::new(png_bytes(10, 10));
        let thumbnailer = thumbnailer();
        let scanner = Scanner::new(&lookup, &images, &thumbnailer);

        let entry = &find_candidates(root.path()).unwrap().entries[0];
        assert!(matches!(
            scanner.process_entry(entry),
            EntryOutcome::Skipped(SkipReason::NoPoster)
        ));
        assert_eq!(images.fetches.get(), 0);
        assert!(!root.path().join("Alien (1979).jpg").exists());
    }

    #[test]
    fn test_absent_poster_skips_without_error() {
        let root = root_with(&["Alien (1979).iso"]);
        let lookup = FakeLookup::default().with("Alien", None);
        let images = StaticImage::new(png_bytes(10, 10));
        let thumbnailer = thumbnailer();

        let summary = Scanner::new(&lookup, &images, &thumbnailer)
            .scan(root.path())
            .unwrap();

        assert_eq!((summary.skipped, summary.errors), (1, 0));
        assert_eq!(images.fetches.get(), 0);
    }

    #[test]
    fn test_thumbnail_created_mid_scan_is_untouched() {
        let root = root_with(&["Alien (1979).iso"]);
        let thumb_path = root.path().join("Alien (1979).jpg");
        let mut lookup = FakeLookup::default().with("Alien", Some(POSTER));
        lookup.plant = Some(thumb_path.clone());
        let images = StaticImage::new(png_bytes(10, 10));
        let thumbnailer = thumbnailer();

        let summary = Scanner::new(&lookup, &images, &thumbnailer)
            .scan(root.path())
            .unwrap();

        assert_eq!((summary.candidates, summary.skipped, summary.errors), (1, 1, 0));
        assert_eq!(images.fetches.get(), 0);
        assert_eq!(fs::read(&thumb_path).unwrap(), b"planted");
    }

    #[test]
    fn test_failures_are_counted_and_scan_continues() {
        let root = root_with(&["Alien (1979).iso", "Unknown (2020).iso", "Zulu (1964).iso"]);
        let lookup = FakeLookup::default()
            .with("Alien", Some(POSTER))
            .with("Zulu", Some(POSTER));
        let images = StaticImage::new(png_bytes(64, 64));
        let thumbnailer = thumbnailer();

        let summary = Scanner::new(&lookup, &images, &thumbnailer)
            .scan(root.path())
            .unwrap();

        assert_eq!(
            summary,
            ScanSummary {
                candidates: 3,
                generated: 2,
                skipped: 0,
                errors: 1
            }
        );
        assert!(summary.has_errors());
        assert!(root.path().join("Zulu (1964).jpg").exists());
        assert!(!root.path().join("Unknown (2020).jpg").exists());
    }

    #[test]
    fn test_download_failure_is_an_error() {
        let root = root_with(&["Alien (1979).iso"]);
        let lookup = FakeLookup::default().with("Alien", Some(POSTER));
        let thumbnailer = thumbnailer();

        let summary = Scanner::new(&lookup, &BrokenImages, &thumbnailer)
            .scan(root.path())
            .unwrap();

        assert_eq!((summary.generated, summary.errors), (0, 1));
        assert!(!root.path().join("Alien (1979).jpg").exists());
    }

    #[test]
    fn test_undecodable_poster_is_an_error() {
        let root = root_with(&["Alien (1979).iso"]);
        let lookup = FakeLookup::default().with("Alien", Some(POSTER));
        let images = StaticImage::new(b"<html>404</html>".to_vec());
        let thumbnailer = thumbnailer();

        let summary = Scanner::new(&lookup, &images, &thumbnailer)
            .scan(root.path())
            .unwrap();

        assert_eq!(summary.errors, 1);
        assert!(!root.path().join("Alien (1979).jpg").exists());
    }

    #[test]
    fn test_prompt_supplies_missing_poster() {
        let root = root_with(&["Alien (1979).iso"]);
        let lookup = FakeLookup::default().with("Alien", Some("N/A"));
        let images = StaticImage::new(png_bytes(20, 30));
        let thumbnailer = thumbnailer();
        let prompt = FixedAnswer("  https://manual.example.com/alien.png\n");

        let summary = Scanner::new(&lookup, &images, &thumbnailer)
            .with_prompt(&prompt)
            .scan(root.path())
            .unwrap();

        assert_eq!(summary.generated, 1);
        assert_eq!(images.fetches.get(), 1);
    }

    #[test]
    fn test_prompt_answer_that_is_not_a_url_skips() {
        let root = root_with(&["Alien (1979).iso"]);
        let lookup = FakeLookup::default().with("Alien", None);
        let images = StaticImage::new(png_bytes(20, 30));
        let thumbnailer = thumbnailer();
        let prompt = FixedAnswer("no idea");

        let summary = Scanner::new(&lookup, &images, &thumbnailer)
            .with_prompt(&prompt)
            .scan(root.path())
            .unwrap();

        assert_eq!((summary.skipped, summary.errors), (1, 0));
        assert_eq!(images.fetches.get(), 0);
    }

    #[test]
    fn test_root_must_be_a_directory() {
        let root = root_with(&["Alien (1979).iso"]);
        let file = root.path().join("Alien (1979).iso");
        assert!(matches!(
            find_candidates(&file),
            Err(PosterError::NotADirectory(_))
        ));
        assert!(matches!(
            find_candidates(&root.path().join("missing")),
            Err(PosterError::NotADirectory(_))
        ));
    }
}
