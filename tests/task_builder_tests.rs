/// Integration tests for BLAST task construction
///
/// Covers the taxonomy filter gate, the wrapper flag contract and the
/// output naming convention.
use pretty_assertions::assert_eq;
use proptest::prelude::*;
use std::path::PathBuf;

use virid::core::config::{BlastConfig, SearchType, TaxidFilter, DEFAULT_DATABASE};
use virid::tools::blast::{output_file_name, FLAGS};
use virid::{build_invocation, ConfigError, SampleUnit, TaskBuilder, TaskResources, ViridError};

fn filter_strategy() -> impl Strategy<Value = TaxidFilter> {
    prop_oneof![
        Just(TaxidFilter::Off),
        "[0-9]{1,7}(,[0-9]{1,7}){0,3}".prop_map(TaxidFilter::Taxids),
    ]
}

fn search_type_strategy() -> impl Strategy<Value = SearchType> {
    prop_oneof![
        Just(SearchType::Megablast),
        Just(SearchType::DcMegablast),
        Just(SearchType::Blastn),
        Just(SearchType::BlastnShort),
        Just(SearchType::Rmblastn),
    ]
}

prop_compose! {
    fn config_strategy()(
        database in "/[a-z]{1,8}/[a-z_0-9]{1,10}",
        evalue in 1e-30f64..100.0,
        search_type in search_type_strategy(),
        max_hsps in 1u32..50,
        max_targets in 1u32..5000,
        restrict_taxids in filter_strategy(),
        ignore_taxids in filter_strategy(),
    ) -> BlastConfig {
        BlastConfig {
            database: PathBuf::from(database),
            evalue,
            search_type,
            max_hsps,
            max_targets,
            restrict_taxids,
            ignore_taxids,
            ..BlastConfig::default()
        }
    }
}

proptest! {
    #[test]
    fn both_filters_set_never_builds(
        config in config_strategy(),
        restrict in "[0-9]{1,7}",
        ignore in "[0-9]{1,7}",
        sample_id in "[A-Za-z0-9_]{1,12}",
    ) {
        let config = BlastConfig {
            restrict_taxids: TaxidFilter::Taxids(restrict),
            ignore_taxids: TaxidFilter::Taxids(ignore),
            ..config
        };
        let result = build_invocation(
            &config,
            &SampleUnit::new(sample_id, "q.fasta"),
            &TaskResources::default(),
        );
        let is_conflict = matches!(
            result,
            Err(ViridError::Config(ConfigError::ConflictingTaxonomyFilters { .. }))
        );
        prop_assert!(is_conflict);
    }

    #[test]
    fn valid_configs_emit_every_flag_once_in_order(
        config in config_strategy(),
        sample_id in "[A-Za-z0-9_.-]{1,16}",
        cpus in 1usize..64,
    ) {
        prop_assume!(!(config.restrict_taxids.is_set() && config.ignore_taxids.is_set()));

        let invocation = build_invocation(
            &config,
            &SampleUnit::new(sample_id.clone(), "/data/q.fasta"),
            &TaskResources::with_cpus(cpus),
        ).unwrap();

        prop_assert_eq!(invocation.args.len(), FLAGS.len() * 2);
        let flags: Vec<&str> = invocation.args.iter().step_by(2).map(String::as_str).collect();
        prop_assert_eq!(flags, FLAGS.to_vec());

        let expected_output = format!("{}_blast.out", sample_id);
        prop_assert_eq!(invocation.flag_value("-o"), Some(expected_output.as_str()));
        prop_assert_eq!(&invocation.output_file, &PathBuf::from(&expected_output));
        prop_assert_eq!(invocation.flag_value("-n"), Some(sample_id.as_str()));
        let threads = cpus.to_string();
        prop_assert_eq!(invocation.flag_value("-t"), Some(threads.as_str()));
    }

    #[test]
    fn building_is_idempotent(
        config in config_strategy(),
        sample_id in "[A-Za-z0-9_]{1,12}",
    ) {
        prop_assume!(!(config.restrict_taxids.is_set() && config.ignore_taxids.is_set()));
        let sample = SampleUnit::new(sample_id, "reads.fasta");
        let resources = TaskResources::with_cpus(2);

        let first = build_invocation(&config, &sample, &resources).unwrap();
        let second = build_invocation(&config, &sample, &resources).unwrap();
        prop_assert_eq!(first.command_line(), second.command_line());
        prop_assert_eq!(first, second);
    }
}

#[test]
fn scenario_defaults() {
    let invocation = build_invocation(
        &BlastConfig::default(),
        &SampleUnit::new("S1", "s1.fasta"),
        &TaskResources::default(),
    )
    .unwrap();

    let rendered = invocation.command_line();
    assert!(rendered.contains(&format!(
        "-d {} -q s1.fasta -o S1_blast.out -t 1 -e 10",
        DEFAULT_DATABASE
    )));
    assert!(rendered.ends_with("-b megablast -m 1 -s 30 -r no -i no -n S1"));
}

#[test]
fn scenario_restrict_only() {
    let config = BlastConfig {
        restrict_taxids: "9606".into(),
        ignore_taxids: "no".into(),
        ..BlastConfig::default()
    };
    let invocation = build_invocation(
        &config,
        &SampleUnit::new("S1", "s1.fasta"),
        &TaskResources::default(),
    )
    .unwrap();

    assert!(invocation.command_line().contains("-r 9606 -i no"));
}

#[test]
fn scenario_conflicting_filters() {
    let config = BlastConfig {
        restrict_taxids: "9606".into(),
        ignore_taxids: "10239".into(),
        ..BlastConfig::default()
    };

    let err = TaskBuilder::new(&config).unwrap_err();
    assert!(err.is_fatal());
    assert!(err.to_string().contains("mutually exclusive taxonomy filters"));
}

#[test]
fn ignore_only_is_allowed() {
    let config = BlastConfig {
        ignore_taxids: "10239,9606".into(),
        ..BlastConfig::default()
    };
    let builder = TaskBuilder::new(&config).unwrap();
    let invocation = builder.build(&SampleUnit::new("S7", "x.fa"), &TaskResources::default());

    assert_eq!(invocation.flag_value("-r"), Some("no"));
    assert_eq!(invocation.flag_value("-i"), Some("10239,9606"));
}

#[test]
fn output_name_convention() {
    assert_eq!(output_file_name("S1"), "S1_blast.out");
    assert_eq!(output_file_name("patient.7"), "patient.7_blast.out");
}

#[test]
fn builder_is_shareable_across_threads() {
    let builder = TaskBuilder::new(&BlastConfig::default()).unwrap();
    let resources = TaskResources::default();

    let invocations: Vec<_> = std::thread::scope(|scope| {
        let handles: Vec<_> = (0..4)
            .map(|i| {
                let builder = &builder;
                let resources = &resources;
                scope.spawn(move || {
                    builder.build(&SampleUnit::new(format!("S{}", i), "q.fa"), resources)
                })
            })
            .collect();
        handles.into_iter().map(|h| h.join().unwrap()).collect()
    });

    for (i, invocation) in invocations.iter().enumerate() {
        assert_eq!(invocation.output_file, PathBuf::from(format!("S{}_blast.out", i)));
    }
}
