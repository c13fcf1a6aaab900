use super::StagingError;
use super::jobs::{JobRenderConfig, write_job_script};
use super::settings::StagingSettings;
use crate::core::io::poscar::PoscarFile;
use crate::core::io::traits::StructureFile;
use crate::core::models::atom::Atom;
use crate::core::models::lattice::Lattice;
use crate::core::models::structure::Structure;
use nalgebra::Vector3;
use std::collections::HashSet;
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use tracing::{debug, info, warn};

/// Default vacuum padding added along the stacking axis, in Angstroms.
pub const DEFAULT_VACUUM: f64 = 25.0;

/// Potential-data directory suffixes tried in order when locating an
/// element's potential file.
const POTENTIAL_SUFFIXES: [&str; 4] = ["_pv", "_sv", "", "_s"];

/// In-plane stacking motif for generated slabs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StackingMotif {
    Bcc,
    Hcp,
}

impl StackingMotif {
    /// In-plane fractional position of the layer with the given index.
    /// Alternate layers are offset to reproduce the bulk stacking sequence.
    fn in_plane_position(&self, layer_index: usize) -> (f64, f64) {
        match (self, layer_index % 2) {
            (StackingMotif::Bcc, 0) => (0.25, 0.75),
            (StackingMotif::Bcc, _) => (0.75, 0.25),
            (StackingMotif::Hcp, 0) => (0.0, 0.0),
            (StackingMotif::Hcp, _) => (2.0 / 3.0, 1.0 / 3.0),
        }
    }
}

impl FromStr for StackingMotif {
    type Err = StagingError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "bcc" => Ok(StackingMotif::Bcc),
            "hcp" => Ok(StackingMotif::Hcp),
            other => Err(StagingError::InvalidRequest(format!(
                "unsupported stacking motif: {other}"
            ))),
        }
    }
}

impl fmt::Display for StackingMotif {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StackingMotif::Bcc => write!(f, "BCC"),
            StackingMotif::Hcp => write!(f, "HCP"),
        }
    }
}

/// Source of prototype structures.
///
/// The production collaborator behind this interface queries a remote
/// materials database for candidate prototypes; this crate ships only a
/// local-file implementation.
pub trait PrototypeSource {
    fn fetch(&self, element: &str, motif: StackingMotif) -> Result<Structure, StagingError>;
}

/// Prototype source backed by a positional file on disk.
#[derive(Debug, Clone)]
pub struct LocalPrototype {
    path: PathBuf,
}

impl LocalPrototype {
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }
}

impl PrototypeSource for LocalPrototype {
    fn fetch(&self, element: &str, _motif: StackingMotif) -> Result<Structure, StagingError> {
        let (structure, _) = PoscarFile::read_from_path(&self.path)?;
        if !structure.atoms.iter().any(|atom| atom.species == element) {
            warn!(
                "Prototype {} does not contain element {element}",
                self.path.display()
            );
        }
        Ok(structure)
    }
}

/// Parameters describing one staging request.
#[derive(Debug, Clone, PartialEq)]
pub struct LayerRequest {
    pub element: String,
    pub motif: StackingMotif,
    pub layer_counts: Vec<usize>,
    pub vacuum: f64,
    pub submit: bool,
}

impl LayerRequest {
    pub fn new(element: &str, motif: StackingMotif, layer_counts: Vec<usize>) -> Self {
        Self {
            element: element.to_string(),
            motif,
            layer_counts,
            vacuum: DEFAULT_VACUUM,
            submit: false,
        }
    }
}

/// Stages run directories for layered structures: per layer count, a
/// `relax/` and `scf/` directory with potential data, input templates, the
/// generated positional file, and a rendered job script.
pub struct LayerStager<'a> {
    settings: &'a StagingSettings,
    base_directory: PathBuf,
}

impl<'a> LayerStager<'a> {
    pub fn new(settings: &'a StagingSettings, base_directory: &Path) -> Self {
        Self {
            settings,
            base_directory: base_directory.to_path_buf(),
        }
    }

    /// Creates all layer directories and returns their paths. Duplicate
    /// layer counts are staged once.
    ///
    /// # Errors
    ///
    /// Returns [`StagingError`] for non-positive layer counts, missing
    /// resources, or failed submission.
    pub fn run(
        &self,
        source: &dyn PrototypeSource,
        request: &LayerRequest,
    ) -> Result<Vec<PathBuf>, StagingError> {
        let prototype = source.fetch(&request.element, request.motif)?;

        let mut counts = request.layer_counts.clone();
        counts.sort_unstable();

        let mut created = Vec::new();
        let mut seen: HashSet<usize> = HashSet::new();
        for count in counts {
            if count < 1 {
                return Err(StagingError::InvalidRequest(
                    "layer count must be positive".to_string(),
                ));
            }
            if !seen.insert(count) {
                debug!("Skipping duplicate layer count: {count}");
                continue;
            }
            created.push(self.stage_layer(&prototype, request, count)?);
        }
        Ok(created)
    }

    fn stage_layer(
        &self,
        prototype: &Structure,
        request: &LayerRequest,
        layer_count: usize,
    ) -> Result<PathBuf, StagingError> {
        let layer_root = self.base_directory.join(layer_count.to_string());
        let relax_dir = layer_root.join("relax");
        let scf_dir = layer_root.join("scf");
        std::fs::create_dir_all(&relax_dir)?;
        std::fs::create_dir_all(&scf_dir)?;
        debug!(
            "Preparing directories: {}, {}",
            relax_dir.display(),
            scf_dir.display()
        );

        let potential = self.read_potential(&request.element)?;
        std::fs::write(relax_dir.join("POTCAR"), &potential)?;
        std::fs::write(scf_dir.join("POTCAR"), &potential)?;

        let relax_input = self.read_template(&self.settings.templates.relax_input)?;
        let scf_input = self.read_template(&self.settings.templates.scf_input)?;
        std::fs::write(relax_dir.join("INCAR"), relax_input)?;
        std::fs::write(scf_dir.join("INCAR"), scf_input)?;

        let structure = build_layer_structure(
            prototype,
            &request.element,
            request.motif,
            layer_count,
            request.vacuum,
        )?;
        PoscarFile::write_structure_to_path(&structure, relax_dir.join("POSCAR"))?;

        let job_name = format!("{}_{}_{}", request.element, request.motif, layer_count);
        let render_config = JobRenderConfig::new(&job_name);
        let job_script = write_job_script(self.settings, &render_config, &relax_dir.join("job.pbs"))?;
        write_job_script(self.settings, &render_config, &scf_dir.join("job.pbs"))?;

        if request.submit {
            submit_job(&job_script, self.settings)?;
        }

        Ok(layer_root)
    }

    fn read_potential(&self, element: &str) -> Result<String, StagingError> {
        let root = &self.settings.tools.potential_root;
        for suffix in POTENTIAL_SUFFIXES {
            let candidate = root.join(format!("{element}{suffix}")).join("POTCAR");
            if candidate.exists() {
                return Ok(std::fs::read_to_string(candidate)?);
            }
        }
        Err(StagingError::PotentialNotFound {
            element: element.to_string(),
            root: root.clone(),
        })
    }

    fn read_template(&self, path: &Path) -> Result<String, StagingError> {
        std::fs::read_to_string(path).map_err(|source| StagingError::Template {
            path: path.to_path_buf(),
            source,
        })
    }
}

/// Builds an N-layer slab from a prototype structure: the in-plane cell of
/// the prototype, layer spacing equal to its mean pairwise distance, vacuum
/// padding along the stacking axis, and alternating motif positions.
///
/// # Errors
///
/// Returns [`StagingError::InvalidRequest`] for a zero layer count.
pub fn build_layer_structure(
    prototype: &Structure,
    element: &str,
    motif: StackingMotif,
    layer_count: usize,
    vacuum: f64,
) -> Result<Structure, StagingError> {
    if layer_count < 1 {
        return Err(StagingError::InvalidRequest(
            "layer count must be positive".to_string(),
        ));
    }

    let spacing = mean_pairwise_distance(prototype);
    let lengths = prototype.lattice.lengths();
    let height = if layer_count == 1 {
        lengths[2] + vacuum
    } else {
        spacing * (layer_count - 1) as f64 + vacuum
    };
    let lattice = Lattice::orthorhombic(lengths[0], lengths[1], height);

    let mut atoms = Vec::with_capacity(layer_count);
    for index in 0..layer_count {
        let (a, b) = motif.in_plane_position(index);
        let c = (spacing * index as f64 + vacuum / 2.0) / height;
        atoms.push(Atom::new(element, Vector3::new(a, b, c)));
    }

    info!(
        "Built {layer_count}-layer {motif} slab for {element}: spacing {spacing:.3}, height {height:.3}"
    );
    Ok(Structure::new(lattice, atoms))
}

/// Mean direct Cartesian distance over all atom pairs; 1.0 for single-atom
/// prototypes.
fn mean_pairwise_distance(structure: &Structure) -> f64 {
    let positions = structure.cartesian_positions();
    let mut sum = 0.0;
    let mut count = 0usize;
    for i in 0..positions.len() {
        for j in (i + 1)..positions.len() {
            sum += (positions[i] - positions[j]).norm();
            count += 1;
        }
    }
    if count == 0 { 1.0 } else { sum / count as f64 }
}

fn submit_job(job_script: &Path, settings: &StagingSettings) -> Result<(), StagingError> {
    let command = &settings.scheduler.submit_command;
    info!("Submitting job: {command} {}", job_script.display());
    let status = std::process::Command::new(command)
        .arg(job_script)
        .status()
        .map_err(|e| StagingError::Submit {
            command: command.clone(),
            message: e.to_string(),
        })?;
    if !status.success() {
        return Err(StagingError::Submit {
            command: command.clone(),
            message: format!("exited with {status}"),
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::staging::settings::{SchedulerSettings, TemplateSettings, ToolSettings};
    use tempfile::TempDir;

    fn two_atom_prototype() -> Structure {
        Structure::new(
            Lattice::orthorhombic(2.8, 2.8, 2.8),
            vec![
                Atom::new("Fe", Vector3::new(0.0, 0.0, 0.0)),
                Atom::new("Fe", Vector3::new(0.5, 0.5, 0.5)),
            ],
        )
    }

    #[test]
    fn slab_height_scales_with_layer_count() {
        let prototype = two_atom_prototype();
        let spacing = (3.0f64 * 1.4 * 1.4).sqrt();

        let one = build_layer_structure(&prototype, "Fe", StackingMotif::Bcc, 1, 25.0).unwrap();
        assert!((one.lattice.lengths()[2] - (2.8 + 25.0)).abs() < 1e-9);

        let three = build_layer_structure(&prototype, "Fe", StackingMotif::Bcc, 3, 25.0).unwrap();
        assert!((three.lattice.lengths()[2] - (2.0 * spacing + 25.0)).abs() < 1e-9);
        assert_eq!(three.len(), 3);
    }

    #[test]
    fn layers_alternate_motif_positions() {
        let prototype = two_atom_prototype();
        let slab = build_layer_structure(&prototype, "Fe", StackingMotif::Bcc, 2, 25.0).unwrap();
        assert_eq!(
            (slab.atoms[0].frac.x, slab.atoms[0].frac.y),
            (0.25, 0.75)
        );
        assert_eq!(
            (slab.atoms[1].frac.x, slab.atoms[1].frac.y),
            (0.75, 0.25)
        );

        let hcp = build_layer_structure(&prototype, "Fe", StackingMotif::Hcp, 2, 25.0).unwrap();
        assert_eq!((hcp.atoms[0].frac.x, hcp.atoms[0].frac.y), (0.0, 0.0));
    }

    #[test]
    fn layers_are_centered_in_the_vacuum() {
        let prototype = two_atom_prototype();
        let slab = build_layer_structure(&prototype, "Fe", StackingMotif::Bcc, 1, 25.0).unwrap();
        let z = slab.atoms[0].frac.z * slab.lattice.lengths()[2];
        assert!((z - 12.5).abs() < 1e-9);
    }

    #[test]
    fn zero_layer_counts_are_rejected() {
        let prototype = two_atom_prototype();
        assert!(matches!(
            build_layer_structure(&prototype, "Fe", StackingMotif::Bcc, 0, 25.0),
            Err(StagingError::InvalidRequest(_))
        ));
    }

    #[test]
    fn motif_parses_case_insensitively() {
        assert_eq!(StackingMotif::from_str("bcc").unwrap(), StackingMotif::Bcc);
        assert_eq!(StackingMotif::from_str("HCP").unwrap(), StackingMotif::Hcp);
        assert!(StackingMotif::from_str("fcc").is_err());
    }

    fn staging_fixture(dir: &TempDir) -> StagingSettings {
        let potential_dir = dir.path().join("potentials").join("Fe_pv");
        std::fs::create_dir_all(&potential_dir).unwrap();
        std::fs::write(potential_dir.join("POTCAR"), "PAW Fe\n").unwrap();

        let template_dir = dir.path().join("templates");
        std::fs::create_dir_all(&template_dir).unwrap();
        std::fs::write(
            template_dir.join("job.sh"),
            "#!/bin/bash\n#JOB {job_name}\n{scheduler_directives}mpirun {simulator_executable}\n",
        )
        .unwrap();
        std::fs::write(template_dir.join("relax.in"), "IBRION = 2\n").unwrap();
        std::fs::write(template_dir.join("scf.in"), "NSW = 0\n").unwrap();

        StagingSettings {
            tools: ToolSettings {
                potential_root: dir.path().join("potentials"),
                simulator_executable: "vasp_std".to_string(),
            },
            scheduler: SchedulerSettings::default(),
            templates: TemplateSettings {
                job_script: template_dir.join("job.sh"),
                relax_input: template_dir.join("relax.in"),
                scf_input: template_dir.join("scf.in"),
            },
        }
    }

    #[test]
    fn stager_lays_out_run_directories() {
        let dir = TempDir::new().unwrap();
        let settings = staging_fixture(&dir);
        let output = dir.path().join("runs");

        let prototype_path = dir.path().join("POSCAR_prototype");
        crate::core::io::poscar::PoscarFile::write_structure_to_path(
            &two_atom_prototype(),
            &prototype_path,
        )
        .unwrap();

        let stager = LayerStager::new(&settings, &output);
        let source = LocalPrototype::new(&prototype_path);
        // Duplicate count 2 staged once.
        let request = LayerRequest::new("Fe", StackingMotif::Bcc, vec![2, 1, 2]);

        let created = stager.run(&source, &request).unwrap();
        assert_eq!(created.len(), 2);
        assert_eq!(created[0], output.join("1"));
        assert_eq!(created[1], output.join("2"));

        for sub in ["relax", "scf"] {
            let run_dir = output.join("2").join(sub);
            assert!(run_dir.join("POTCAR").exists());
            assert!(run_dir.join("INCAR").exists());
            assert!(run_dir.join("job.pbs").exists());
        }
        assert!(output.join("2").join("relax").join("POSCAR").exists());

        let job = std::fs::read_to_string(output.join("2").join("relax").join("job.pbs")).unwrap();
        assert!(job.contains("#JOB Fe_BCC_2"));
    }

    #[test]
    fn stager_rejects_zero_layer_counts() {
        let dir = TempDir::new().unwrap();
        let settings = staging_fixture(&dir);
        let prototype_path = dir.path().join("POSCAR_prototype");
        crate::core::io::poscar::PoscarFile::write_structure_to_path(
            &two_atom_prototype(),
            &prototype_path,
        )
        .unwrap();

        let stager = LayerStager::new(&settings, dir.path());
        let request = LayerRequest::new("Fe", StackingMotif::Bcc, vec![0]);
        assert!(matches!(
            stager.run(&LocalPrototype::new(&prototype_path), &request),
            Err(StagingError::InvalidRequest(_))
        ));
    }

    #[test]
    fn missing_potentials_are_reported() {
        let dir = TempDir::new().unwrap();
        let settings = staging_fixture(&dir);
        let prototype_path = dir.path().join("POSCAR_prototype");
        crate::core::io::poscar::PoscarFile::write_structure_to_path(
            &two_atom_prototype(),
            &prototype_path,
        )
        .unwrap();

        let stager = LayerStager::new(&settings, dir.path());
        let request = LayerRequest::new("W", StackingMotif::Bcc, vec![1]);
        assert!(matches!(
            stager.run(&LocalPrototype::new(&prototype_path), &request),
            Err(StagingError::PotentialNotFound { .. })
        ));
    }
}
