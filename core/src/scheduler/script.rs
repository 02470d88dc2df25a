use anyhow::{anyhow, bail, Result};
use serde_yaml::Value;

/// One `#SBATCH` line. `value: None` renders as a bare flag.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Directive {
    pub key: String,
    pub value: Option<String>,
}

/// `cpus_per_task` and `--cpus-per-task` both become `cpus-per-task`.
pub fn normalize_key(key: &str) -> String {
    key.trim().trim_start_matches('-').replace('_', "-")
}

/// A SLURM batch script: interpreter, directives, then shell lines.
#[derive(Debug, Clone, Default)]
pub struct BatchScript {
    shell: String,
    directives: Vec<Directive>,
    commands: Vec<String>,
}

impl BatchScript {
    pub fn new(shell: impl Into<String>) -> Self {
        Self {
            shell: shell.into(),
            directives: Vec::new(),
            commands: Vec::new(),
        }
    }

    /// Convert configuration options into directives, in file order.
    ///
    /// Scalars render as `--key=value`, `true`/null as a bare flag, `false`
    /// drops the option, and a list of scalars is comma-joined. Nested
    /// mappings and non-string keys are rejected.
    pub fn with_options(mut self, options: &serde_yaml::Mapping) -> Result<Self> {
        for (k, v) in options {
            let key = k
                .as_str()
                .ok_or_else(|| anyhow!("scheduler option key must be a string, got {k:?}"))?;
            let value = match v {
                Value::Bool(false) => continue,
                Value::Bool(true) | Value::Null => None,
                Value::Sequence(items) => Some(
                    items
                        .iter()
                        .map(|item| scalar(key, item))
                        .collect::<Result<Vec<_>>>()?
                        .join(","),
                ),
                other => Some(scalar(key, other)?),
            };
            self.set(key, value)?;
        }
        Ok(self)
    }

    pub fn set(&mut self, key: &str, value: Option<String>) -> Result<()> {
        let key = normalize_key(key);
        if key.is_empty() || key.contains(char::is_whitespace) {
            bail!("invalid scheduler option name '{key}'");
        }
        if let Some(v) = value.as_deref() {
            if v.contains('\n') || v.contains('\r') {
                bail!("scheduler option '{key}' spans multiple lines");
            }
        }

        match self.directives.iter_mut().find(|d| d.key == key) {
            Some(existing) => existing.value = value,
            None => self.directives.push(Directive { key, value }),
        }
        Ok(())
    }

    pub fn push_command(&mut self, cmd: impl Into<String>) {
        self.commands.push(cmd.into());
    }

    pub fn directives(&self) -> &[Directive] {
        &self.directives
    }

    pub fn render(&self, command: &str) -> String {
        let mut out = format!("#!{}\n", self.shell);
        for d in &self.directives {
            match &d.value {
                Some(v) => out.push_str(&format!("#SBATCH --{}={}\n", d.key, v)),
                None => out.push_str(&format!("#SBATCH --{}\n", d.key)),
            }
        }
        out.push('\n');
        for cmd in &self.commands {
            out.push_str(cmd);
            out.push('\n');
        }
        out.push_str(command);
        out.push('\n');
        out
    }
}

fn scalar(key: &str, v: &Value) -> Result<String> {
    match v {
        Value::String(s) => Ok(s.clone()),
        Value::Number(n) => Ok(n.to_string()),
        Value::Bool(b) => Ok(b.to_string()),
        _ => bail!("scheduler option '{key}' must be a scalar"),
    }
}
