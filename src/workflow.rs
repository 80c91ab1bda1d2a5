use std::path::{Path, PathBuf};
use tracing::{info, warn};
use walkdir::WalkDir;

use crate::config::{Config, ExportConfig};
use crate::document::{Document, MASTER_FILE_NAME, Meta};
use crate::error::{JimakuError, Result};
use crate::media::{MediaProcessor, MediaProcessorFactory, build_output_path, validate_subtitle_format};
use crate::subtitle::{SubtitleFormat, parse_srt, write_subtitles, write_transcripts};
use crate::transcript::import_transcript;
use crate::translate::{TranslateOptions, TranslationSummary, TranslatorFactory, translate_document};

/// Where an output video goes and how it is named
#[derive(Debug, Clone, Default)]
pub struct OutputTarget {
    pub out: Option<PathBuf>,
    pub out_dir: Option<PathBuf>,
    pub same_name: bool,
    pub suffix: Option<String>,
}

pub struct Workflow {
    config: Config,
    media: Box<dyn MediaProcessor>,
}

impl Workflow {
    pub fn new(config: Config) -> Self {
        let media = MediaProcessorFactory::create_processor(config.media.clone());
        Self { config, media }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// `<input dir>/_jobs/<input stem>`
    pub fn default_workdir(input: &Path) -> PathBuf {
        let stem = input
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| "job".to_string());
        input
            .parent()
            .unwrap_or_else(|| Path::new("."))
            .join("_jobs")
            .join(stem)
    }

    /// Copy or extract the audio track of `input` into the work directory
    pub async fn ingest(&self, input: &Path, workdir: Option<&Path>) -> Result<PathBuf> {
        let workdir = workdir
            .map(Path::to_path_buf)
            .unwrap_or_else(|| Self::default_workdir(input));
        info!("Ingesting {} into {}", input.display(), workdir.display());
        self.media.extract_audio(input, &workdir).await
    }

    /// Build `master.json` from an ASR transcript or an SRT file
    pub fn import(&self, source: &Path, workdir: &Path) -> Result<PathBuf> {
        let document = match SubtitleFormat::from_path(source) {
            Some(SubtitleFormat::Srt) => {
                if !source.exists() {
                    return Err(JimakuError::FileNotFound(source.display().to_string()));
                }
                let content = std::fs::read_to_string(source)?;
                let mut meta = Meta::new(source.display().to_string());
                meta.tool_versions.insert("import".to_string(), "srt".to_string());
                Document::new(meta, parse_srt(&content)?)
            }
            Some(other) => {
                return Err(JimakuError::UnsupportedFormat(format!(
                    "{} (import accepts ASR JSON or SRT)",
                    other
                )));
            }
            None => import_transcript(source)?,
        };

        let master = Document::master_path(workdir)?;
        document.save(&master)?;
        write_transcripts(&document, workdir, "transcript_ja", false)?;
        info!("Imported {} segments into {}", document.segments.len(), master.display());
        Ok(master)
    }

    /// Merge a file with one romanized line per segment into the master
    pub fn romanize(&self, master: &Path, romanized_file: &Path) -> Result<()> {
        let mut document = Document::load(master)?;
        if !romanized_file.exists() {
            return Err(JimakuError::FileNotFound(romanized_file.display().to_string()));
        }
        let content = std::fs::read_to_string(romanized_file)?;
        let lines: Vec<String> = content.lines().map(|line| line.trim().to_string()).collect();

        document.add_romanized(lines)?;
        document
            .meta
            .tool_versions
            .insert("romanizer".to_string(), romanized_file.display().to_string());
        document.save(master)?;

        let dir = master.parent().unwrap_or_else(|| Path::new("."));
        write_transcripts(&document, dir, "transcript_romaji", true)?;
        Ok(())
    }

    /// Translate the master into every target language and save it back
    pub async fn translate(
        &self,
        master: &Path,
        target_languages: &[String],
        on_progress: &(dyn Fn(usize, usize) + Send + Sync),
    ) -> Result<TranslationSummary> {
        let mut document = Document::load(master)?;
        let translator = TranslatorFactory::create_translator(&self.config.translate)?;

        let summary = translate_document(
            &mut document,
            target_languages,
            translator.as_ref(),
            TranslateOptions::from(&self.config.translate),
            on_progress,
        )
        .await?;

        document
            .meta
            .tool_versions
            .insert("translator".to_string(), translator.name().to_string());
        document.save(master)?;
        Ok(summary)
    }

    fn default_export_path(master: &Path, export: &ExportConfig) -> PathBuf {
        master
            .parent()
            .unwrap_or_else(|| Path::new("."))
            .join(format!("subs_{}.{}", export.primary_lang, export.format))
    }

    /// Render one subtitle file; defaults to `<master dir>/subs_<lang>.<ext>`
    pub fn export(&self, master: &Path, out: Option<&Path>, export: &ExportConfig) -> Result<PathBuf> {
        let document = Document::load(master)?;
        let output_path = match out {
            Some(path) => path.to_path_buf(),
            None => Self::default_export_path(master, export),
        };

        write_subtitles(
            &document,
            &output_path,
            export.format.extension(),
            &export.primary_lang,
            export.secondary_lang.as_deref(),
            export.wrap_options(),
        )
    }

    /// Export every `master.json` found under `root`.
    ///
    /// A master whose default output is already newer than it is skipped
    /// unless `force` is set.
    pub fn batch_export(&self, root: &Path, export: &ExportConfig, force: bool) -> Result<Vec<PathBuf>> {
        if !root.is_dir() {
            return Err(JimakuError::Config(format!(
                "{} is not a directory",
                root.display()
            )));
        }

        let masters: Vec<PathBuf> = WalkDir::new(root)
            .into_iter()
            .filter_map(|e| e.ok())
            .filter(|entry| entry.file_type().is_file() && entry.file_name() == MASTER_FILE_NAME)
            .map(|entry| entry.into_path())
            .collect();

        info!("Found {} master documents under {}", masters.len(), root.display());

        let mut written = Vec::new();
        for master in masters {
            let output = Self::default_export_path(&master, export);
            if !force && is_up_to_date(&output, &master) {
                info!("Skipping {}, {} is up to date", master.display(), output.display());
                continue;
            }
            match self.export(&master, Some(&output), export) {
                Ok(path) => written.push(path),
                Err(e) => warn!("Failed to export {}: {}", master.display(), e),
            }
        }

        Ok(written)
    }

    /// Mux subtitles into a container; default suffix is empty
    pub async fn softcode(
        &self,
        video: &Path,
        subtitles: &Path,
        target: &OutputTarget,
        language: Option<&str>,
    ) -> Result<PathBuf> {
        let container = self.config.media.container.to_lowercase();
        validate_subtitle_format(&container, subtitles)?;

        let output_path = build_output_path(
            video,
            subtitles,
            target.out.as_deref(),
            target.out_dir.as_deref(),
            target.same_name,
            target.suffix.as_deref().unwrap_or(""),
            &container,
        );
        self.media.mux_soft(video, subtitles, &output_path, language).await
    }

    /// Burn subtitles into an MP4; default suffix is `.hard`
    pub async fn hardcode(&self, video: &Path, subtitles: &Path, target: &OutputTarget) -> Result<PathBuf> {
        let output_path = build_output_path(
            video,
            subtitles,
            target.out.as_deref(),
            target.out_dir.as_deref(),
            target.same_name,
            target.suffix.as_deref().unwrap_or(".hard"),
            "mp4",
        );
        self.media.burn_subtitles(video, subtitles, &output_path).await
    }

    /// Copy subtitles next to the video as an external track.
    ///
    /// Naming follows softcode, with the subtitle's own extension. Copying a
    /// file onto itself is a no-op.
    pub async fn sidecar(&self, video: &Path, subtitles: &Path, target: &OutputTarget) -> Result<PathBuf> {
        if !subtitles.exists() {
            return Err(JimakuError::FileNotFound(subtitles.display().to_string()));
        }
        let extension = subtitles
            .extension()
            .map(|ext| ext.to_string_lossy().to_lowercase())
            .ok_or_else(|| JimakuError::UnsupportedFormat(subtitles.display().to_string()))?;

        let output_path = build_output_path(
            video,
            subtitles,
            target.out.as_deref(),
            target.out_dir.as_deref(),
            target.same_name,
            target.suffix.as_deref().unwrap_or(""),
            &extension,
        );

        if output_path == subtitles {
            info!("{} is already in place", output_path.display());
            return Ok(output_path);
        }
        if let Some(parent) = output_path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        tokio::fs::copy(subtitles, &output_path).await?;
        info!("Copied {} to {}", subtitles.display(), output_path.display());
        Ok(output_path)
    }

    /// Report the ffmpeg version
    pub async fn doctor(&self) -> Result<String> {
        self.media.version().await
    }
}

/// True when `output` exists and was modified no earlier than `source`
fn is_up_to_date(output: &Path, source: &Path) -> bool {
    let modified = |path: &Path| std::fs::metadata(path).and_then(|m| m.modified()).ok();
    match (modified(output), modified(source)) {
        (Some(output), Some(source)) => output >= source,
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::Segment;
    use assert_fs::TempDir;
    use assert_fs::prelude::*;

    fn master_in(dir: &Path) -> PathBuf {
        let doc = Document::new(
            Meta::new("episode.mkv"),
            vec![
                Segment::new(1, 0.0, 1.5, "こんにちは").unwrap(),
                Segment::new(2, 2.0, 3.0, "さようなら").unwrap(),
            ],
        );
        let path = Document::master_path(dir).unwrap();
        doc.save(&path).unwrap();
        path
    }

    #[test]
    fn test_default_workdir() {
        assert_eq!(
            Workflow::default_workdir(Path::new("media/Episode 01.mkv")),
            PathBuf::from("media/_jobs/Episode 01")
        );
    }

    #[test]
    fn test_import_srt_and_asr() {
        let dir = TempDir::new().unwrap();
        let workflow = Workflow::new(Config::default());

        let srt = dir.child("source.srt");
        srt.write_str("1\n00:00:01,000 --> 00:00:02,000\nはい\n").unwrap();
        let master = workflow.import(srt.path(), &dir.path().join("job_a")).unwrap();
        let doc = Document::load(&master).unwrap();
        assert_eq!(doc.segments[0].source_text(), "はい");
        assert_eq!(doc.meta.tool_versions.get("import").map(String::as_str), Some("srt"));
        dir.child("job_a/transcript_ja.txt").assert("はい");
        dir.child("job_a/transcript_ja.srt")
            .assert("1\n00:00:01,000 --> 00:00:02,000\nはい\n");

        let asr = dir.child("asr.json");
        asr.write_str(r#"[{"start": 0.0, "end": 1.0, "text": "いいえ"}]"#).unwrap();
        let master = workflow.import(asr.path(), &dir.path().join("job_b")).unwrap();
        assert_eq!(Document::load(&master).unwrap().segments.len(), 1);

        let vtt = dir.child("source.vtt");
        vtt.write_str("WEBVTT\n").unwrap();
        assert!(matches!(
            workflow.import(vtt.path(), dir.path()),
            Err(JimakuError::UnsupportedFormat(_))
        ));
    }

    #[test]
    fn test_romanize_merges_lines() {
        let dir = TempDir::new().unwrap();
        let master = master_in(dir.path());
        let romaji = dir.child("romaji.txt");
        romaji.write_str("konnichiwa\nsayounara\n").unwrap();

        let workflow = Workflow::new(Config::default());
        workflow.romanize(&master, romaji.path()).unwrap();
        let doc = Document::load(&master).unwrap();
        assert_eq!(doc.segments[1].romanized_text(), Some("sayounara"));
        dir.child("transcript_romaji.txt").assert("konnichiwa\nsayounara");
        let srt = std::fs::read_to_string(dir.path().join("transcript_romaji.srt")).unwrap();
        assert!(srt.contains("00:00:02,000 --> 00:00:03,000\nsayounara\n"));

        romaji.write_str("only one\n").unwrap();
        assert!(matches!(
            workflow.romanize(&master, romaji.path()),
            Err(JimakuError::LengthMismatch { expected: 2, actual: 1, .. })
        ));
    }

    #[test]
    fn test_translate_then_export_bilingual() {
        let dir = TempDir::new().unwrap();
        let master = master_in(dir.path());
        let workflow = Workflow::new(Config::default());

        let summary = tokio_test::block_on(workflow.translate(&master, &["en".to_string()], &|_, _| {}))
            .unwrap();
        assert_eq!(summary.failed_blocks, 0);

        let export = ExportConfig {
            format: SubtitleFormat::Vtt,
            primary_lang: "en".to_string(),
            secondary_lang: Some("ja".to_string()),
            ..ExportConfig::default()
        };
        let out = workflow.export(&master, None, &export).unwrap();
        assert_eq!(out, dir.path().join("subs_en.vtt"));
        let content = std::fs::read_to_string(out).unwrap();
        assert!(content.starts_with("WEBVTT\n\n1\n00:00:00.000 --> 00:00:01.500\nこんにちは\nこんにちは\n"));
    }

    #[test]
    fn test_batch_export_walks_workdirs() {
        let dir = TempDir::new().unwrap();
        master_in(&dir.path().join("_jobs").join("ep1"));
        master_in(&dir.path().join("_jobs").join("ep2"));
        dir.child("_jobs/broken/master.json").write_str("{not json").unwrap();

        let workflow = Workflow::new(Config::default());
        let mut written = workflow.batch_export(dir.path(), &ExportConfig::default(), false).unwrap();
        written.sort();
        assert_eq!(
            written,
            vec![
                dir.path().join("_jobs/ep1/subs_ja.srt"),
                dir.path().join("_jobs/ep2/subs_ja.srt"),
            ]
        );
    }

    #[test]
    fn test_batch_export_skips_fresh_outputs_unless_forced() {
        let dir = TempDir::new().unwrap();
        master_in(&dir.path().join("ep1"));
        let workflow = Workflow::new(Config::default());
        let export = ExportConfig::default();

        assert_eq!(workflow.batch_export(dir.path(), &export, false).unwrap().len(), 1);
        assert!(workflow.batch_export(dir.path(), &export, false).unwrap().is_empty());
        assert_eq!(
            workflow.batch_export(dir.path(), &export, true).unwrap(),
            vec![dir.path().join("ep1/subs_ja.srt")]
        );
    }

    #[test]
    fn test_sidecar_copies_next_to_video() {
        let dir = TempDir::new().unwrap();
        let subs = dir.child("_jobs/ep1/subs_en.srt");
        subs.write_str("1\n00:00:00,000 --> 00:00:01,000\nHi\n").unwrap();
        let video = dir.child("Episode 01.mkv");
        let workflow = Workflow::new(Config::default());

        let copied = tokio_test::block_on(workflow.sidecar(video.path(), subs.path(), &OutputTarget::default()))
            .unwrap();
        assert_eq!(copied, dir.path().join("subs_en.srt"));
        dir.child("subs_en.srt").assert("1\n00:00:00,000 --> 00:00:01,000\nHi\n");

        let target = OutputTarget {
            same_name: true,
            suffix: Some(".en".to_string()),
            ..OutputTarget::default()
        };
        let copied = tokio_test::block_on(workflow.sidecar(video.path(), subs.path(), &target)).unwrap();
        assert_eq!(copied, dir.path().join("Episode 01.en.srt"));

        let in_place = tokio_test::block_on(workflow.sidecar(video.path(), &copied, &target)).unwrap();
        assert_eq!(in_place, copied);
        dir.child("Episode 01.en.srt").assert("1\n00:00:00,000 --> 00:00:01,000\nHi\n");

        let missing = tokio_test::block_on(workflow.sidecar(
            video.path(),
            &dir.path().join("none.srt"),
            &OutputTarget::default(),
        ));
        assert!(matches!(missing, Err(JimakuError::FileNotFound(_))));
    }

    #[test]
    fn test_softcode_rejects_ass_in_mp4() {
        let mut config = Config::default();
        config.media.container = "mp4".to_string();
        let workflow = Workflow::new(config);

        let err = tokio_test::block_on(workflow.softcode(
            Path::new("in.mp4"),
            Path::new("styled.ass"),
            &OutputTarget::default(),
            None,
        ))
        .unwrap_err();
        assert!(matches!(err, JimakuError::Media(_)));
    }
}
