use super::StagingError;
use super::settings::StagingSettings;
use std::path::{Path, PathBuf};

/// Job-script rendering parameters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobRenderConfig {
    pub job_name: String,
    pub stdout: String,
    pub stderr: String,
}

impl JobRenderConfig {
    pub fn new(job_name: &str) -> Self {
        Self {
            job_name: job_name.to_string(),
            stdout: "%j.out".to_string(),
            stderr: "%j.err".to_string(),
        }
    }
}

/// Renders the batch submission script from the configured template.
///
/// The template carries `{placeholder}` markers for the job name, the
/// scheduler directive block, node counts, I/O redirection, and the
/// simulator executable.
///
/// # Errors
///
/// Returns [`StagingError::Template`] if the template cannot be read.
pub fn render_job_script(
    settings: &StagingSettings,
    params: &JobRenderConfig,
) -> Result<String, StagingError> {
    let template_path = &settings.templates.job_script;
    let template =
        std::fs::read_to_string(template_path).map_err(|source| StagingError::Template {
            path: template_path.clone(),
            source,
        })?;

    let scheduler = &settings.scheduler;
    let mut directives = String::new();
    if let Some(partition) = &scheduler.partition {
        directives.push_str(&format!("#SBATCH --partition={partition}\n"));
    }
    if let Some(exclude) = &scheduler.exclude {
        directives.push_str(&format!("#SBATCH --exclude={exclude}\n"));
    }
    for extra in &scheduler.extra_lines {
        directives.push_str(extra);
        directives.push('\n');
    }

    Ok(template
        .replace("{job_name}", &params.job_name)
        .replace("{scheduler_directives}", &directives)
        .replace("{nodes}", &scheduler.nodes.to_string())
        .replace("{ntasks_per_node}", &scheduler.ntasks_per_node.to_string())
        .replace("{export_env}", &scheduler.export_env)
        .replace("{stdout}", &params.stdout)
        .replace("{stderr}", &params.stderr)
        .replace("{simulator_executable}", &settings.tools.simulator_executable))
}

/// Writes the rendered script to `destination` and returns the path. The
/// script is made group-executable.
///
/// # Errors
///
/// Returns [`StagingError`] if rendering or writing fails.
pub fn write_job_script(
    settings: &StagingSettings,
    params: &JobRenderConfig,
    destination: &Path,
) -> Result<PathBuf, StagingError> {
    let content = render_job_script(settings, params)?;
    std::fs::write(destination, content)?;
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        std::fs::set_permissions(destination, std::fs::Permissions::from_mode(0o750))?;
    }
    Ok(destination.to_path_buf())
}
