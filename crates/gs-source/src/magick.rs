// Ce module délègue le décodage d'image à ImageMagick via subprocess
// (std::process::Command). Prérequis runtime : `magick` dans le PATH.
//
// Architecture :
//   - `sanitize_shell_arg` / `quote_cmd_arg` : liste blanche de caractères pour `sh` / `cmd`
//   - `MagickConverter`    : lance `magick <src> -compress none <tmp>/out.pgm`, met en cache
//   - `RasterProvider`     : expose le fichier produit comme flux P2

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use std::time::SystemTime;

use anyhow::{Context, Result};
use gs_core::error::ConvertError;
use gs_core::traits::RasterProvider;

/// Ponctuation conservée dans un chemin passé à `sh -c`.
const POSIX_PATH_PUNCTUATION: &[char] = &['_', '.', '/', '-'];

/// Ponctuation conservée dans un chemin passé à `cmd /C`, entre guillemets.
const CMD_PATH_PUNCTUATION: &[char] = &['_', '.', '/', '-', '\\', ':', '~', ' '];

/// Neutralise un chemin pour une ligne de commande `sh -c`.
///
/// Keeps letters, digits and `_ . / -`, escapes spaces as `\ ` and drops
/// everything else. A leading `-` gets a `./` prefix so the path cannot be
/// read as an option. Only needed when the command goes through a shell.
///
/// # Example
/// ```
/// use gs_source::magick::sanitize_shell_arg;
/// assert_eq!(sanitize_shell_arg("my photo.png; rm -rf ~"), "my\\ photo.png\\ rm\\ -rf\\ ");
/// assert_eq!(sanitize_shell_arg("/tmp/a_b.2.jpg"), "/tmp/a_b.2.jpg");
/// assert_eq!(sanitize_shell_arg("-rf.png"), "./-rf.png");
/// ```
#[must_use]
pub fn sanitize_shell_arg(input: &str) -> String {
    let mut out = String::with_capacity(input.len() + 8);
    if input.trim_start_matches(|c: char| !is_posix_path_char(c)).starts_with('-') {
        out.push_str("./");
    }
    for ch in input.chars() {
        if ch == ' ' {
            out.push_str("\\ ");
        } else if is_posix_path_char(ch) {
            out.push(ch);
        }
    }
    if out.is_empty() {
        out.push_str("''");
    }
    out
}

fn is_posix_path_char(c: char) -> bool {
    c.is_alphanumeric() || POSIX_PATH_PUNCTUATION.contains(&c)
}

/// Neutralise un chemin pour une ligne de commande `cmd /C`.
///
/// Keeps letters, digits and `_ . / - \ : ~` plus spaces, then wraps the
/// result in double quotes. `%`, `^`, `!` and quotes are dropped: cmd
/// expands them even inside a quoted string.
///
/// # Example
/// ```
/// use gs_source::magick::quote_cmd_arg;
/// assert_eq!(quote_cmd_arg(r"C:\My Pictures\cat.png"), r#""C:\My Pictures\cat.png""#);
/// assert_eq!(quote_cmd_arg("a%PATH%^&b.png"), r#""aPATHb.png""#);
/// ```
#[must_use]
pub fn quote_cmd_arg(input: &str) -> String {
    let kept: String = input
        .chars()
        .filter(|&c| c.is_alphanumeric() || CMD_PATH_PUNCTUATION.contains(&c))
        .collect();
    // Un `\` final échapperait le guillemet fermant côté argv.
    format!("\"{}\"", kept.trim_end_matches('\\'))
}

/// Dernier fichier converti, pour éviter de relancer ImageMagick.
#[derive(Clone, Debug, PartialEq, Eq)]
struct CachedRaster {
    source: PathBuf,
    modified: Option<SystemTime>,
}

/// Convertisseur ImageMagick avec cache du dernier résultat.
///
/// # Example
/// ```no_run
/// use gs_source::magick::MagickConverter;
/// use gs_core::traits::RasterProvider;
/// use std::path::Path;
///
/// let mut converter = MagickConverter::new("magick", false).unwrap();
/// let raster = converter.acquire(Path::new("photo.jpg")).unwrap();
/// ```
pub struct MagickConverter {
    program: String,
    use_shell: bool,
    workdir: tempfile::TempDir,
    cache: Option<CachedRaster>,
}

impl MagickConverter {
    /// Create a converter writing into a private temporary directory.
    ///
    /// # Errors
    /// Returns an error if the temporary directory cannot be created.
    pub fn new(program: impl Into<String>, use_shell: bool) -> Result<Self> {
        let workdir = tempfile::Builder::new()
            .prefix("grayscii-")
            .tempdir()
            .context("Impossible de créer le dossier temporaire")?;
        Ok(Self {
            program: program.into(),
            use_shell,
            workdir,
            cache: None,
        })
    }

    /// Path of the raster produced by the last conversion.
    #[must_use]
    pub fn output_path(&self) -> PathBuf {
        self.workdir.path().join("out.pgm")
    }

    /// Shell command line used when `use_shell` is set.
    #[must_use]
    pub fn shell_command_line(&self, source: &Path) -> String {
        let quote = if cfg!(windows) {
            quote_cmd_arg
        } else {
            sanitize_shell_arg
        };
        format!(
            "{} {} -compress none {}",
            self.program,
            quote(&source.to_string_lossy()),
            quote(&self.output_path().to_string_lossy()),
        )
    }

    fn build_command(&self, source: &Path) -> Command {
        if self.use_shell {
            let line = self.shell_command_line(source);
            log::debug!("magick (shell) : {line}");
            let mut cmd = if cfg!(windows) {
                let mut c = Command::new("cmd");
                c.arg("/C");
                c
            } else {
                let mut c = Command::new("sh");
                c.arg("-c");
                c
            };
            cmd.arg(line);
            cmd
        } else {
            let mut cmd = Command::new(&self.program);
            cmd.arg(source)
                .args(["-compress", "none"])
                .arg(self.output_path());
            log::debug!("magick : {cmd:?}");
            cmd
        }
    }

    fn convert(&self, source: &Path) -> Result<(), ConvertError> {
        let status = self
            .build_command(source)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::inherit())
            .status()
            .map_err(|e| {
                ConvertError::RasterUnavailable(format!(
                    "cannot launch {}: {e}",
                    self.program
                ))
            })?;
        if !status.success() {
            // Le fichier produit (s'il existe) reste la seule source de vérité.
            log::warn!("{} a terminé avec {status}", self.program);
        }
        Ok(())
    }

    fn is_cached(&self, key: &CachedRaster) -> bool {
        self.cache.as_ref() == Some(key) && self.output_path().is_file()
    }
}

impl RasterProvider for MagickConverter {
    fn acquire(&mut self, source: &Path) -> Result<Box<dyn BufRead + Send>, ConvertError> {
        let key = CachedRaster {
            source: source.to_path_buf(),
            modified: std::fs::metadata(source).and_then(|m| m.modified()).ok(),
        };

        if self.is_cached(&key) {
            log::debug!("Raster en cache pour {}", source.display());
        } else {
            self.cache = None;
            // Un ancien out.pgm ne doit pas passer pour le résultat de cette conversion.
            let _ = std::fs::remove_file(self.output_path());
            log::info!("Conversion de {} via {}", source.display(), self.program);
            self.convert(source)?;
            self.cache = Some(key);
        }

        let path = self.output_path();
        let file = File::open(&path).map_err(|e| {
            self.cache = None;
            ConvertError::RasterUnavailable(format!("{}: {e}", path.display()))
        })?;
        Ok(Box::new(BufReader::new(file)))
    }

    fn name(&self) -> &'static str {
        "magick"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Read;

    #[test]
    fn sanitize_strips_control_characters() {
        assert_eq!(sanitize_shell_arg("a;b|c&d$e`f"), "abcdef");
        assert_eq!(sanitize_shell_arg("x$(reboot)"), "xreboot");
    }

    #[test]
    fn sanitize_drops_characters_outside_allow_list() {
        assert_eq!(sanitize_shell_arg("a\tb.png"), "ab.png");
        assert_eq!(sanitize_shell_arg("#comment.png"), "comment.png");
        assert_eq!(sanitize_shell_arg("~/[ab].png"), "/ab.png");
        assert_eq!(sanitize_shell_arg("%PATH%^x.png"), "PATHx.png");
        assert_eq!(sanitize_shell_arg("é t.png"), "é\\ t.png");
        assert_eq!(sanitize_shell_arg(";|&"), "''");
    }

    #[test]
    fn sanitize_guards_leading_dash() {
        assert_eq!(sanitize_shell_arg("-rf"), "./-rf");
        assert_eq!(sanitize_shell_arg(";-delete.png"), "./-delete.png");
        assert_eq!(sanitize_shell_arg("a-b.png"), "a-b.png");
    }

    #[test]
    fn sanitize_escapes_spaces() {
        assert_eq!(sanitize_shell_arg("My Pictures/cat 1.png"), "My\\ Pictures/cat\\ 1.png");
    }

    #[test]
    fn cmd_quoting_drops_expansion_characters() {
        assert_eq!(quote_cmd_arg("a b.png"), "\"a b.png\"");
        assert_eq!(quote_cmd_arg("x\"&del *.png"), "\"xdel .png\"");
        assert_eq!(quote_cmd_arg("!VAR!%TMP%.png"), "\"VARTMP.png\"");
        assert_eq!(quote_cmd_arg(r"C:\Users\RUNNER~1\out.pgm"), r#""C:\Users\RUNNER~1\out.pgm""#);
        assert_eq!(quote_cmd_arg(r"C:\pics\"), r#""C:\pics""#);
    }

    #[cfg(unix)]
    #[test]
    fn shell_line_uses_sanitized_paths() {
        let converter = MagickConverter::new("magick", true).unwrap();
        let line = converter.shell_command_line(Path::new("a b;.png"));
        assert!(line.starts_with("magick a\\ b.png -compress none "));
        assert!(line.ends_with("out.pgm"));
    }

    #[cfg(windows)]
    #[test]
    fn shell_line_quotes_paths_for_cmd() {
        let converter = MagickConverter::new("magick", true).unwrap();
        let line = converter.shell_command_line(Path::new("a b&.png"));
        assert!(line.starts_with("magick \"a b.png\" -compress none \""));
        assert!(line.ends_with("out.pgm\""));
    }

    #[test]
    fn missing_program_is_unavailable() {
        let mut converter = MagickConverter::new("grayscii-no-such-program", false).unwrap();
        let err = converter.acquire(Path::new("photo.png")).err().unwrap();
        assert!(matches!(err, ConvertError::RasterUnavailable(_)), "{err:?}");
        assert!(converter.cache.is_none());
    }

    fn read_all(mut reader: Box<dyn BufRead + Send>) -> String {
        let mut text = String::new();
        reader.read_to_string(&mut text).unwrap();
        text
    }

    #[cfg(unix)]
    #[test]
    fn unchanged_source_reuses_previous_raster() {
        let dir = tempfile::tempdir().unwrap();
        // Run the "image" as a script: `sh <src> -compress none <out>` writes to $3.
        let source = dir.path().join("img.sh");
        std::fs::write(&source, "printf 'P2 1 1 255 0' > \"$3\"\n").unwrap();
        let mut converter = MagickConverter::new("sh", false).unwrap();

        assert_eq!(read_all(converter.acquire(&source).unwrap()), "P2 1 1 255 0");

        // A second conversion would overwrite this marker.
        std::fs::write(converter.output_path(), "P2 1 1 255 7").unwrap();
        assert_eq!(read_all(converter.acquire(&source).unwrap()), "P2 1 1 255 7");
    }
}
