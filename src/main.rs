//! Binary entry point: load features, run the clustering engine, write the
//! winning run.

mod cli;

use anyhow::{Context, Result};
use clap::Parser;
use log::info;

use cli::Cli;
use metabin::cluster::{cluster, ClusterConfig};
use metabin::feature::FeatureMatrix;
use metabin::io::{read_contigs, read_coverage, read_feature_csv, write_result};
use metabin::model::ModelKind;
use metabin::KmerTable;

fn main() -> Result<()> {
    env_logger::init();
    let args = Cli::parse();

    if args.threads > 0 {
        rayon::ThreadPoolBuilder::new()
            .num_threads(args.threads)
            .build_global()?;
        info!("using {} threads", args.threads);
    }

    run(args)
}

fn run(args: Cli) -> Result<()> {
    let config = ClusterConfig {
        clusters: args.clusters,
        epsilon: args.epsilon,
        max_iterations: args.iterations,
        runs: args.runs,
        serial: args.serial,
        seed: args.seed,
    };

    let (features, composition_dim) = load_features(&args)?;
    info!(
        "clustering {} items x {} features: {:?} model, {:?}, p={}, {} runs",
        features.n_items(),
        features.dim(),
        args.model,
        args.algorithm,
        args.clusters,
        args.runs
    );

    let model = args.model.resolve(features.dim(), composition_dim)?;
    let result = cluster(args.algorithm, model.as_ref(), &features, &config, None)?;
    info!(
        "clustering finished: log-likelihood {:.6}, {} iterations, converged: {}",
        result.log_likelihood, result.iterations, result.converged
    );

    write_result(&args.output, features.ids(), &result)?;
    Ok(())
}

/// Builds the feature matrix for the selected model. For the combined model
/// the returned split is the number of leading composition columns.
fn load_features(args: &Cli) -> Result<(FeatureMatrix, Option<usize>)> {
    match args.model {
        ModelKind::Composition => Ok((load_composition(args)?, None)),
        ModelKind::Coverage => Ok((load_coverage(args)?, None)),
        ModelKind::Combined => {
            let composition = load_composition(args)?;
            let coverage = load_coverage(args)?;
            let split = composition.dim();
            Ok((composition.hstack(&coverage)?, Some(split)))
        }
    }
}

fn load_composition(args: &Cli) -> Result<FeatureMatrix> {
    let path = args
        .composition_file
        .as_deref()
        .context("--composition-file is required for this model")?;
    if args.feature_vectors {
        Ok(read_feature_csv(path)?)
    } else {
        let table = KmerTable::new(args.kmer)?;
        Ok(read_contigs(path, &table)?)
    }
}

fn load_coverage(args: &Cli) -> Result<FeatureMatrix> {
    let path = args
        .coverage_file
        .as_deref()
        .context("--coverage-file is required for this model")?;
    if args.feature_vectors {
        Ok(read_feature_csv(path)?)
    } else {
        let last = args
            .last_data
            .context("--last-data is required for raw coverage input")?;
        Ok(read_coverage(
            path,
            args.first_data,
            last,
            args.read_length,
            args.read_mappings,
        )?)
    }
}
