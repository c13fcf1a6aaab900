use crate::cli::StageArgs;
use crate::error::Result;
use layerkit::staging::layers::{LayerRequest, LayerStager, LocalPrototype, StackingMotif};
use layerkit::staging::settings::StagingSettings;
use layerkit::staging::StagingError;
use tracing::info;

pub fn run(args: StageArgs) -> Result<()> {
    let settings = StagingSettings::load(&args.settings).map_err(StagingError::from)?;
    let motif: StackingMotif = args.motif.parse()?;

    let request = LayerRequest {
        element: args.element.clone(),
        motif,
        layer_counts: args.layers.clone(),
        vacuum: args.vacuum,
        submit: args.submit,
    };

    info!(
        "Staging {} layer count(s) for {} ({motif})",
        request.layer_counts.len(),
        request.element
    );
    let stager = LayerStager::new(&settings, &args.output);
    let source = LocalPrototype::new(&args.prototype);
    let created = stager.run(&source, &request)?;

    for path in created {
        println!("Created layer directory: {}", path.display());
    }
    Ok(())
}
