//! Subprocess-backed stage adapters.
//!
//! Acquisition, speech synthesis, video rendering and uploading are delegated
//! to programs configured under `[stages]`. Arguments are templates: every
//! `{name}` token is replaced with the invocation's value for `name`.
//!
//! Output conventions:
//! - acquire: each non-empty stdout line is a path it wrote
//! - narrate: an optional `duration=<seconds>` stdout line
//! - publish: the last non-empty stdout line is the content identifier

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::sync::LazyLock;
use std::time::Duration;

use async_trait::async_trait;
use regex::Regex;
use tokio::process::Command;
use tracing::{debug, info, instrument};

use filingcast_shared::{
    CommandSpec, DATE_TOKEN_FORMAT, FilingcastError, Result, Stage, StagesConfig,
};

use crate::stages::{
    AcquireRequest, Acquirer, NarrateRequest, NarrationOutput, Narrator, PublishRequest,
    Publisher, RenderRequest, Renderer,
};

/// Characters of stderr kept in a failure message.
const STDERR_TAIL: usize = 400;

type Vars = BTreeMap<&'static str, String>;

// ---------------------------------------------------------------------------
// Templating
// ---------------------------------------------------------------------------

static PLACEHOLDER_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\{([a-z_]+)\}").expect("valid regex"));

/// Substitute `{name}` tokens in `template` in a single pass, so values that
/// themselves contain braces are never expanded. Unknown tokens are kept.
pub fn render_template(template: &str, vars: &BTreeMap<&'static str, String>) -> String {
    PLACEHOLDER_RE
        .replace_all(template, |caps: &regex::Captures<'_>| match vars.get(&caps[1]) {
            Some(value) => value.clone(),
            None => caps[0].to_string(),
        })
        .into_owned()
}

fn path_var(path: &Path) -> String {
    path.to_string_lossy().into_owned()
}

fn opt_path_var(path: Option<&PathBuf>) -> String {
    path.map(|p| path_var(p)).unwrap_or_default()
}

// ---------------------------------------------------------------------------
// CommandStage
// ---------------------------------------------------------------------------

/// Runs one configured program for one stage.
#[derive(Debug, Clone)]
pub struct CommandStage {
    stage: Stage,
    spec: CommandSpec,
}

impl CommandStage {
    pub fn new(stage: Stage, spec: CommandSpec) -> Self {
        Self { stage, spec }
    }

    pub fn args(&self, vars: &Vars) -> Vec<String> {
        self.spec
            .args
            .iter()
            .map(|a| render_template(a, vars))
            .collect()
    }

    /// Run to completion and return stdout. Non-zero exit is a stage error.
    #[instrument(skip_all, fields(stage = %self.stage, program = %self.spec.program))]
    async fn run(&self, vars: &Vars) -> Result<String> {
        let args = self.args(vars);
        debug!(?args, "spawning stage command");

        let output = Command::new(&self.spec.program)
            .args(&args)
            .stdin(Stdio::null())
            .kill_on_drop(true)
            .output()
            .await
            .map_err(|e| {
                FilingcastError::stage(
                    self.stage.as_str(),
                    format!("failed to spawn '{}': {e}", self.spec.program),
                )
            })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            let stderr = stderr.trim();
            let start = stderr
                .char_indices()
                .rev()
                .nth(STDERR_TAIL)
                .map_or(0, |(i, _)| i);
            return Err(FilingcastError::stage(
                self.stage.as_str(),
                format!(
                    "'{}' exited with {}: {}",
                    self.spec.program,
                    output.status,
                    &stderr[start..]
                ),
            ));
        }

        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }
}

/// Read a `duration=<seconds>` line from narrator output.
pub fn parse_duration_line(stdout: &str) -> Option<Duration> {
    stdout.lines().find_map(|line| {
        let secs: f64 = line.trim().strip_prefix("duration=")?.trim().parse().ok()?;
        (secs.is_finite() && secs >= 0.0).then(|| Duration::from_secs_f64(secs))
    })
}

#[async_trait]
impl Acquirer for CommandStage {
    async fn acquire(&self, request: &AcquireRequest) -> Result<Vec<PathBuf>> {
        let vars = Vars::from([
            ("entity", request.entity.clone().unwrap_or_default()),
            (
                "date",
                request
                    .date
                    .map(|d| d.format(DATE_TOKEN_FORMAT).to_string())
                    .unwrap_or_default(),
            ),
            ("limit", request.limit.map(|l| l.to_string()).unwrap_or_default()),
            ("dest", path_var(&request.dest_dir)),
            ("download", path_var(&request.download_dir)),
        ]);

        let stdout = self.run(&vars).await?;
        let written: Vec<PathBuf> = stdout
            .lines()
            .map(str::trim)
            .filter(|l| !l.is_empty())
            .map(PathBuf::from)
            .collect();
        info!(files = written.len(), "acquisition finished");
        Ok(written)
    }
}

#[async_trait]
impl Narrator for CommandStage {
    async fn narrate(&self, request: &NarrateRequest) -> Result<NarrationOutput> {
        let vars = Vars::from([
            ("input", path_var(&request.text_path)),
            ("text_file", path_var(&request.text_path)),
            ("output", path_var(&request.output)),
        ]);

        let stdout = self.run(&vars).await?;
        Ok(NarrationOutput {
            duration: parse_duration_line(&stdout),
        })
    }
}

#[async_trait]
impl Renderer for CommandStage {
    async fn render(&self, request: &RenderRequest) -> Result<()> {
        let metrics = match &request.metrics {
            Some(m) => serde_json::to_string(m)
                .map_err(|e| FilingcastError::stage("render", format!("metrics json: {e}")))?,
            None => String::new(),
        };

        let vars = Vars::from([
            ("input", path_var(&request.audio)),
            ("text_file", path_var(&request.text_path)),
            ("output", path_var(&request.output)),
            ("thumbnail", path_var(&request.thumbnail)),
            ("subtitle", opt_path_var(request.subtitle.as_ref())),
            ("entity", request.entity_name.clone()),
            (
                "date",
                request
                    .publication_date
                    .map(|d| d.format(DATE_TOKEN_FORMAT).to_string())
                    .unwrap_or_default(),
            ),
            ("metrics", metrics),
        ]);

        self.run(&vars).await.map(|_| ())
    }
}

#[async_trait]
impl Publisher for CommandStage {
    async fn publish(&self, request: &PublishRequest) -> Result<String> {
        let vars = Vars::from([
            ("input", path_var(&request.video)),
            ("title", request.title.clone()),
            ("description", request.description.clone()),
            ("visibility", request.visibility.to_string()),
            ("tags", request.tags.join(",")),
            ("category", request.category_id.clone()),
            ("subtitle", opt_path_var(request.subtitle.as_ref())),
            ("thumbnail", opt_path_var(request.thumbnail.as_ref())),
        ]);

        let stdout = self.run(&vars).await?;
        stdout
            .lines()
            .map(str::trim)
            .rfind(|l| !l.is_empty())
            .map(String::from)
            .ok_or_else(|| {
                FilingcastError::stage("publish", "command printed no content identifier")
            })
    }
}

// ---------------------------------------------------------------------------
// UnconfiguredStage
// ---------------------------------------------------------------------------

/// Stand-in for a stage with no `[stages]` entry. Always fails when invoked.
#[derive(Debug, Clone, Copy)]
pub struct UnconfiguredStage(pub Stage);

impl UnconfiguredStage {
    fn error(&self) -> FilingcastError {
        FilingcastError::stage(
            self.0.as_str(),
            format!(
                "no command configured; add [stages.{}] to filingcast.toml",
                self.0
            ),
        )
    }
}

#[async_trait]
impl Acquirer for UnconfiguredStage {
    async fn acquire(&self, _request: &AcquireRequest) -> Result<Vec<PathBuf>> {
        Err(self.error())
    }
}

#[async_trait]
impl Narrator for UnconfiguredStage {
    async fn narrate(&self, _request: &NarrateRequest) -> Result<NarrationOutput> {
        Err(self.error())
    }
}

#[async_trait]
impl Renderer for UnconfiguredStage {
    async fn render(&self, _request: &RenderRequest) -> Result<()> {
        Err(self.error())
    }
}

#[async_trait]
impl Publisher for UnconfiguredStage {
    async fn publish(&self, _request: &PublishRequest) -> Result<String> {
        Err(self.error())
    }
}

// ---------------------------------------------------------------------------
// Wiring helpers
// ---------------------------------------------------------------------------

pub fn acquirer_from(config: &StagesConfig) -> Box<dyn Acquirer> {
    match &config.acquire {
        Some(spec) => Box::new(CommandStage::new(Stage::Acquire, spec.clone())),
        None => Box::new(UnconfiguredStage(Stage::Acquire)),
    }
}

pub fn narrator_from(config: &StagesConfig) -> Box<dyn Narrator> {
    match &config.narrate {
        Some(spec) => Box::new(CommandStage::new(Stage::Narrate, spec.clone())),
        None => Box::new(UnconfiguredStage(Stage::Narrate)),
    }
}

pub fn renderer_from(config: &StagesConfig) -> Box<dyn Renderer> {
    match &config.render {
        Some(spec) => Box::new(CommandStage::new(Stage::Render, spec.clone())),
        None => Box::new(UnconfiguredStage(Stage::Render)),
    }
}

pub fn publisher_from(config: &StagesConfig) -> Box<dyn Publisher> {
    match &config.publish {
        Some(spec) => Box::new(CommandStage::new(Stage::Publish, spec.clone())),
        None => Box::new(UnconfiguredStage(Stage::Publish)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use filingcast_shared::{ItemKey, Visibility};

    fn sh(stage: Stage, script: &str) -> CommandStage {
        CommandStage::new(
            stage,
            CommandSpec {
                program: "sh".into(),
                args: vec!["-c".into(), script.into()],
            },
        )
    }

    fn publish_request(video: PathBuf) -> PublishRequest {
        PublishRequest {
            item_key: ItemKey::new("Acme", None),
            video,
            title: "Acme 決算サマリー".into(),
            description: "desc".into(),
            tags: vec!["決算".into(), "Acme".into()],
            category_id: "27".into(),
            visibility: Visibility::Private,
            subtitle: None,
            thumbnail: None,
        }
    }

    #[test]
    fn template_substitutes_known_tokens_only() {
        let vars = Vars::from([("input", "/a b.txt".to_string()), ("output", "o.mp3".into())]);
        assert_eq!(render_template("--in={input}", &vars), "--in=/a b.txt");
        assert_eq!(render_template("{output}:{unknown}", &vars), "o.mp3:{unknown}");

        let vars = Vars::from([("title", "{description}".to_string()), ("description", "d".into())]);
        assert_eq!(render_template("{title}", &vars), "{description}");
    }

    #[test]
    fn duration_line_is_optional() {
        assert_eq!(
            parse_duration_line("wrote file\nduration=12.5\n"),
            Some(Duration::from_millis(12_500))
        );
        assert_eq!(parse_duration_line("done"), None);
        assert_eq!(parse_duration_line("duration=abc"), None);
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn narrate_passes_paths_and_reads_duration() {
        let tmp = tempfile::tempdir().unwrap();
        let text = tmp.path().join("Acme_extracted_text.txt");
        let audio = tmp.path().join("Acme_output.mp3");
        std::fs::write(&text, "本文").unwrap();

        // `sh -c script arg0 arg1`: positional args follow the script.
        let stage = CommandStage::new(
            Stage::Narrate,
            CommandSpec {
                program: "sh".into(),
                args: vec![
                    "-c".into(),
                    "cp \"$0\" \"$1\" && echo duration=3.0".into(),
                    "{input}".into(),
                    "{output}".into(),
                ],
            },
        );

        let out = stage
            .narrate(&NarrateRequest {
                text_path: text.clone(),
                text: "本文".into(),
                output: audio.clone(),
            })
            .await
            .unwrap();
        assert_eq!(out.duration, Some(Duration::from_secs(3)));
        assert!(audio.exists());
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn publish_returns_last_stdout_line() {
        let stage = sh(Stage::Publish, "echo uploading; echo; echo vid-123");
        let id = stage
            .publish(&publish_request(PathBuf::from("/tmp/v.mp4")))
            .await
            .unwrap();
        assert_eq!(id, "vid-123");
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn non_zero_exit_is_stage_error_with_stderr() {
        let stage = sh(Stage::Publish, "echo quota exceeded >&2; exit 3");
        let err = stage
            .publish(&publish_request(PathBuf::from("/tmp/v.mp4")))
            .await
            .unwrap_err();
        let msg = err.to_string();
        assert!(msg.starts_with("publish failed"), "{msg}");
        assert!(msg.contains("quota exceeded"), "{msg}");
    }

    #[tokio::test]
    async fn unconfigured_stage_fails_with_hint() {
        let stages = StagesConfig::default();
        let err = narrator_from(&stages)
            .narrate(&NarrateRequest {
                text_path: "t".into(),
                text: String::new(),
                output: "o".into(),
            })
            .await
            .unwrap_err();
        assert!(err.to_string().contains("[stages.narrate]"));
    }
}
