//! Command-line templating.
//!
//! Templates use `{name}` placeholders; `{{` and `}}` produce literal braces.
//! Rendering fails on any placeholder without a value, so a built command
//! never carries unresolved template syntax.

use lazy_static::lazy_static;
use regex::Regex;

use super::spec::JobSpec;
use crate::config::AppConfig;
use crate::error::TemplateError;

/// Output space used when the caller does not name one.
pub const DEFAULT_OUTPUT_SPACE: &str = "MNI152NLin2009cAsym";

const ALL_SUBJECTS_FLAG: &str = "--participant-label allsubs";

lazy_static! {
    static ref TOKEN_RE: Regex = Regex::new(r"\{\{|\}\}|\{([^{}]*)\}|[{}]").unwrap();
}

/// Substitute `vars` into `template`.
pub fn render_template(template: &str, vars: &[(&str, &str)]) -> Result<String, TemplateError> {
    let mut out = String::with_capacity(template.len());
    let mut last = 0;

    for caps in TOKEN_RE.captures_iter(template) {
        let Some(whole) = caps.get(0) else {
            continue;
        };
        out.push_str(&template[last..whole.start()]);
        last = whole.end();

        match whole.as_str() {
            "{{" => out.push('{'),
            "}}" => out.push('}'),
            "{" => {
                return Err(TemplateError::Unclosed {
                    offset: whole.start(),
                })
            }
            "}" => {
                return Err(TemplateError::UnmatchedBrace {
                    offset: whole.start(),
                })
            }
            _ => {
                let name = caps.get(1).map(|m| m.as_str()).unwrap_or_default();
                let value = vars
                    .iter()
                    .find(|(k, _)| *k == name)
                    .map(|(_, v)| *v)
                    .ok_or_else(|| TemplateError::UnknownPlaceholder {
                        name: name.to_string(),
                    })?;
                out.push_str(value);
            }
        }
    }

    out.push_str(&template[last..]);
    Ok(out)
}

/// Remove every whitespace-delimited `--participant-label allsubs` from `cmd`.
///
/// Only the literal flag is touched; `--participant-label allsubs2` and
/// similar are left alone. Applying it twice gives the same result as once.
pub fn strip_all_subjects_flag(cmd: &str) -> String {
    let mut out = String::with_capacity(cmd.len());
    let mut rest = cmd;
    let mut prev_is_boundary = true;

    while let Some(idx) = rest.find(ALL_SUBJECTS_FLAG) {
        let before = &rest[..idx];
        let after = &rest[idx + ALL_SUBJECTS_FLAG.len()..];

        let starts_clean = match before.chars().last() {
            Some(c) => c.is_whitespace(),
            None => prev_is_boundary,
        };
        let ends_clean = after.chars().next().map_or(true, char::is_whitespace);

        out.push_str(before);
        if !(starts_clean && ends_clean) {
            out.push_str(ALL_SUBJECTS_FLAG);
        }
        prev_is_boundary = if starts_clean && ends_clean {
            // Removed text leaves whatever preceded it as the new boundary.
            out.chars().last().map_or(true, char::is_whitespace)
        } else {
            false
        };
        rest = after;
    }

    out.push_str(rest);
    out
}

/// Builds the fMRIPrep command line and the environment activation line
/// for one subject.
pub struct CommandBuilder<'a> {
    cfg: &'a AppConfig,
    spec: &'a JobSpec,
}

impl<'a> CommandBuilder<'a> {
    pub fn new(cfg: &'a AppConfig, spec: &'a JobSpec) -> Self {
        Self { cfg, spec }
    }

    pub fn build(
        &self,
        extra_flags: &[String],
        output_spaces: &[String],
    ) -> Result<String, TemplateError> {
        let spaces = if output_spaces.is_empty() {
            DEFAULT_OUTPUT_SPACE.to_string()
        } else {
            output_spaces.join(" ")
        };

        let outpath = self.spec.out_path.to_string_lossy();
        let bidspath = self.spec.bids_path.to_string_lossy();
        let workpath = self.spec.work_path.to_string_lossy();
        let fs_license = self.cfg.paths.fs_license.to_string_lossy();

        let mut cmd = render_template(
            &self.cfg.cmds.cmd_wcard,
            &[
                ("outpath", outpath.as_ref()),
                ("subject", self.spec.subject_id.as_str()),
                ("bidspath", bidspath.as_ref()),
                ("fs_license", fs_license.as_ref()),
                ("workpath", workpath.as_ref()),
                ("output_spaces", spaces.as_str()),
            ],
        )?;

        if !extra_flags.is_empty() {
            cmd.push(' ');
            cmd.push_str(&extra_flags.join(" "));
        }

        if self.spec.selects_all_subjects() {
            cmd = strip_all_subjects_flag(&cmd);
        }

        tracing::debug!(job = %self.spec.job_name, command = %cmd, "command built");
        Ok(cmd)
    }

    pub fn activation_command(&self) -> Result<String, TemplateError> {
        let tf_path = self.cfg.paths.tf_path.to_string_lossy();
        render_template(&self.cfg.cmds.tf_wcard, &[("tf_path", tf_path.as_ref())])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn substitutes_named_placeholders() {
        let out = render_template("run {a} then {b} and {a}", &[("a", "x"), ("b", "y")]).unwrap();
        assert_eq!(out, "run x then y and x");
    }

    #[test]
    fn doubled_braces_are_literal() {
        let out = render_template("echo {{HOME}} {v}", &[("v", "1")]).unwrap();
        assert_eq!(out, "echo {HOME} 1");
    }

    #[test]
    fn unknown_placeholder_fails() {
        let err = render_template("fmriprep {bidspath} {nope}", &[("bidspath", "/d")]).unwrap_err();
        assert_eq!(
            err,
            TemplateError::UnknownPlaceholder {
                name: "nope".into()
            }
        );
    }

    #[test]
    fn empty_placeholder_fails() {
        let err = render_template("x {} y", &[]).unwrap_err();
        assert_eq!(err, TemplateError::UnknownPlaceholder { name: "".into() });
    }

    #[test]
    fn stray_braces_fail() {
        assert_eq!(
            render_template("a {b", &[("b", "1")]).unwrap_err(),
            TemplateError::Unclosed { offset: 2 }
        );
        assert_eq!(
            render_template("a } b", &[]).unwrap_err(),
            TemplateError::UnmatchedBrace { offset: 2 }
        );
    }

    #[test]
    fn strip_removes_literal_flag() {
        assert_eq!(
            strip_all_subjects_flag(
                "fmriprep /b /o participant --participant-label allsubs --nthreads 4"
            ),
            "fmriprep /b /o participant  --nthreads 4"
        );
        assert_eq!(
            strip_all_subjects_flag("fmriprep --participant-label allsubs"),
            "fmriprep "
        );
    }

    #[test]
    fn strip_is_noop_without_flag() {
        let cmd = "fmriprep /b /o participant --participant-label 01";
        assert_eq!(strip_all_subjects_flag(cmd), cmd);
    }

    #[test]
    fn strip_leaves_longer_labels() {
        let cmd = "fmriprep --participant-label allsubs2 --x";
        assert_eq!(strip_all_subjects_flag(cmd), cmd);
        let cmd = "fmriprep x--participant-label allsubs";
        assert_eq!(strip_all_subjects_flag(cmd), cmd);
    }

    #[test]
    fn strip_is_idempotent() {
        for cmd in [
            "a --participant-label allsubs b",
            "--participant-label allsubs --participant-label allsubs",
            "--participant-label --participant-label allsubs allsubs",
            "plain",
        ] {
            let once = strip_all_subjects_flag(cmd);
            assert_eq!(strip_all_subjects_flag(&once), once, "input: {cmd}");
        }
    }
}
