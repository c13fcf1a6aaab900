use serde::Deserialize;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("File I/O error for '{path}': {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("TOML parsing error for '{path}': {source}")]
    Toml {
        path: String,
        #[source]
        source: toml::de::Error,
    },
}

/// Batch-scheduler submission settings.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct SchedulerSettings {
    #[serde(default = "default_submit_command")]
    pub submit_command: String,
    #[serde(default)]
    pub partition: Option<String>,
    #[serde(default)]
    pub exclude: Option<String>,
    #[serde(default = "default_nodes")]
    pub nodes: u32,
    #[serde(default = "default_ntasks_per_node")]
    pub ntasks_per_node: u32,
    #[serde(default = "default_export_env")]
    pub export_env: String,
    #[serde(default)]
    pub extra_lines: Vec<String>,
}

impl Default for SchedulerSettings {
    fn default() -> Self {
        Self {
            submit_command: default_submit_command(),
            partition: None,
            exclude: None,
            nodes: default_nodes(),
            ntasks_per_node: default_ntasks_per_node(),
            export_env: default_export_env(),
            extra_lines: Vec::new(),
        }
    }
}

/// Locations of the template files, relative to the settings file unless
/// absolute.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct TemplateSettings {
    #[serde(default = "default_job_script")]
    pub job_script: PathBuf,
    #[serde(default = "default_relax_input")]
    pub relax_input: PathBuf,
    #[serde(default = "default_scf_input")]
    pub scf_input: PathBuf,
}

impl Default for TemplateSettings {
    fn default() -> Self {
        Self {
            job_script: default_job_script(),
            relax_input: default_relax_input(),
            scf_input: default_scf_input(),
        }
    }
}

/// File-system paths for external tools and resources.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct ToolSettings {
    pub potential_root: PathBuf,
    pub simulator_executable: String,
}

/// All runtime settings for the staging workflow.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct StagingSettings {
    pub tools: ToolSettings,
    #[serde(default)]
    pub scheduler: SchedulerSettings,
    #[serde(default)]
    pub templates: TemplateSettings,
}

impl StagingSettings {
    /// Loads settings from a TOML file, resolving relative template paths
    /// against the file's directory.
    ///
    /// # Errors
    ///
    /// Returns [`SettingsError`] if the file cannot be read or parsed.
    pub fn load(path: &Path) -> Result<Self, SettingsError> {
        let content = std::fs::read_to_string(path).map_err(|e| SettingsError::Io {
            path: path.to_string_lossy().to_string(),
            source: e,
        })?;
        let mut settings: StagingSettings =
            toml::from_str(&content).map_err(|e| SettingsError::Toml {
                path: path.to_string_lossy().to_string(),
                source: e,
            })?;
        if let Some(root) = path.parent() {
            settings.templates = settings.templates.resolved_against(root);
        }
        Ok(settings)
    }
}

impl TemplateSettings {
    fn resolved_against(&self, root: &Path) -> Self {
        let resolve = |path: &Path| {
            if path.is_absolute() {
                path.to_path_buf()
            } else {
                root.join(path)
            }
        };
        Self {
            job_script: resolve(&self.job_script),
            relax_input: resolve(&self.relax_input),
            scf_input: resolve(&self.scf_input),
        }
    }
}

fn default_submit_command() -> String {
    "qsub".to_string()
}
fn default_nodes() -> u32 {
    1
}
fn default_ntasks_per_node() -> u32 {
    48
}
fn default_export_env() -> String {
    "ALL".to_string()
}
fn default_job_script() -> PathBuf {
    PathBuf::from("resources/job_template.sh")
}
fn default_relax_input() -> PathBuf {
    PathBuf::from("resources/incar_relax.in")
}
fn default_scf_input() -> PathBuf {
    PathBuf::from("resources/incar_scf.in")
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::TempDir;

    fn write_settings(dir: &TempDir, content: &str) -> PathBuf {
        let path = dir.path().join("layerkit.toml");
        let mut file = std::fs::File::create(&path).unwrap();
        file.write_all(content.as_bytes()).unwrap();
        path
    }

    #[test]
    fn loads_minimal_settings_with_defaults() {
        let dir = TempDir::new().unwrap();
        let path = write_settings(
            &dir,
            "\
[tools]
potential_root = \"/data/potentials\"
simulator_executable = \"vasp_std\"
",
        );

        let settings = StagingSettings::load(&path).unwrap();
        assert_eq!(settings.scheduler.submit_command, "qsub");
        assert_eq!(settings.scheduler.nodes, 1);
        assert_eq!(settings.scheduler.ntasks_per_node, 48);
        assert_eq!(settings.scheduler.export_env, "ALL");
        assert_eq!(
            settings.tools.potential_root,
            PathBuf::from("/data/potentials")
        );
    }

    #[test]
    fn resolves_relative_template_paths_against_the_file() {
        let dir = TempDir::new().unwrap();
        let path = write_settings(
            &dir,
            "\
[tools]
potential_root = \"/data/potentials\"
simulator_executable = \"vasp_std\"

[templates]
job_script = \"templates/job.sh\"
",
        );

        let settings = StagingSettings::load(&path).unwrap();
        assert_eq!(
            settings.templates.job_script,
            dir.path().join("templates/job.sh")
        );
    }

    #[test]
    fn reads_scheduler_overrides() {
        let dir = TempDir::new().unwrap();
        let path = write_settings(
            &dir,
            "\
[tools]
potential_root = \"/data/potentials\"
simulator_executable = \"vasp_std\"

[scheduler]
submit_command = \"sbatch\"
partition = \"compute\"
nodes = 2
extra_lines = [\"#SBATCH --qos=high\"]
",
        );

        let settings = StagingSettings::load(&path).unwrap();
        assert_eq!(settings.scheduler.submit_command, "sbatch");
        assert_eq!(settings.scheduler.partition.as_deref(), Some("compute"));
        assert_eq!(settings.scheduler.nodes, 2);
        assert_eq!(settings.scheduler.extra_lines.len(), 1);
    }

    #[test]
    fn rejects_unknown_fields() {
        let dir = TempDir::new().unwrap();
        let path = write_settings(
            &dir,
            "\
[tools]
potential_root = \"/data/potentials\"
simulator_executable = \"vasp_std\"
unknown_field = 1
",
        );
        assert!(matches!(
            StagingSettings::load(&path).unwrap_err(),
            SettingsError::Toml { .. }
        ));
    }

    #[test]
    fn missing_files_surface_as_io_errors() {
        assert!(matches!(
            StagingSettings::load(Path::new("/nonexistent/layerkit.toml")).unwrap_err(),
            SettingsError::Io { .. }
        ));
    }
}
