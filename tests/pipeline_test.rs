//! End-to-end tests: fixture tree file through the service container to
//! assembled vignette records.

use std::path::Path;

use rand::rngs::SmallRng;
use rand::SeedableRng;

use vignette::config::Settings;
use vignette::domain::{DrawOptions, Method, OutputStyle};
use vignette::infrastructure::ServiceContainer;
use vignette::util::testing;

#[ctor::ctor]
fn init() {
    testing::init_test_setup();
}

fn demo_tree() -> &'static Path {
    Path::new("./tests/resources/trees/demo.json")
}

fn forced(weights: Vec<f64>) -> DrawOptions {
    DrawOptions {
        multiple: false,
        method: Method::Complex,
        weights: Some(weights),
    }
}

#[test]
fn given_demo_tree_when_first_candidates_forced_then_exact_stimulus() {
    // Arrange
    let container = ServiceContainer::new(Settings::default());
    let mut rng = SmallRng::seed_from_u64(1);

    // Act - weight mass on the first candidate at every order
    let vignette = container
        .generator
        .generate_from_file(demo_tree(), &forced(vec![1.0, 0.0]), OutputStyle::Text, &mut rng)
        .unwrap();

    // Assert
    assert_eq!(
        vignette.vignette,
        "You will read a short description of a job applicant.\n\n\
         The applicant has ten years of experience.\n\n\
         References rate the work as excellent."
    );
    assert_eq!(
        vignette.selected_treats,
        vec![Vec::<u32>::new(), vec![1], vec![1, 1]]
    );
}

#[test]
fn given_demo_tree_when_second_candidates_forced_then_html_breaks_between_orders() {
    let container = ServiceContainer::new(Settings::default());
    let mut rng = SmallRng::seed_from_u64(1);

    let vignette = container
        .generator
        .generate_from_file(demo_tree(), &forced(vec![0.0, 1.0]), OutputStyle::Html, &mut rng)
        .unwrap();

    assert_eq!(
        vignette.vignette,
        "You will read a short description of a job applicant.<br /><br />\
         The applicant has two years of experience.<br /><br />\
         References rate the work as adequate."
    );
    assert_eq!(
        vignette.selected_treats,
        vec![Vec::<u32>::new(), vec![2], vec![2, 2]]
    );
}

#[test]
fn given_certain_inclusion_weights_when_drawn_multiple_then_every_fragment_appears() {
    let container = ServiceContainer::new(Settings::default());
    let opts = DrawOptions {
        multiple: true,
        method: Method::Simple,
        weights: Some(vec![1.0, 1.0]),
    };
    let mut rng = SmallRng::seed_from_u64(1);

    let vignette = container
        .generator
        .generate_from_file(demo_tree(), &opts, OutputStyle::Text, &mut rng)
        .unwrap();

    // Both branches and all four leaves settle, in author order.
    assert_eq!(vignette.treatment_text.len(), 7);
    assert_eq!(
        vignette.vignette,
        "You will read a short description of a job applicant.\n\n\
         The applicant has ten years of experience.\n\n\
         References rate the work as excellent.\n\n\
         References rate the work as adequate.\n\n\
         The applicant has two years of experience.\n\n\
         References rate the work as excellent.\n\n\
         References rate the work as adequate."
    );
}

#[test]
fn given_generated_vignette_when_serialized_then_analysis_fields_present() {
    let container = ServiceContainer::new(Settings::default());
    let mut rng = SmallRng::seed_from_u64(42);

    let vignette = container
        .generator
        .generate_from_file(
            demo_tree(),
            &DrawOptions::default(),
            OutputStyle::Html,
            &mut rng,
        )
        .unwrap();

    // Act - one JSON record per vignette, as the CLI emits it
    let record = serde_json::to_value(&vignette).unwrap();

    // Assert
    let object = record.as_object().unwrap();
    assert!(object.contains_key("vignette"));
    assert!(object.contains_key("treatment_text"));
    assert!(object.contains_key("selected_treats"));
    let selected = object["selected_treats"].as_array().unwrap();
    assert_eq!(selected.len(), 3);
    assert!(selected.iter().all(|path| path.is_array()));
}

#[test]
fn given_demo_tree_when_inspected_then_report_matches_fixture() {
    let container = ServiceContainer::new(Settings::default());

    let report = container.generator.inspect(demo_tree()).unwrap();

    assert_eq!(report.depth, 2);
    assert_eq!(report.branches, 3);
    assert_eq!(report.leaves, 7);
    assert_eq!(report.root_candidates, vec!["treat_1", "treat_2"]);
}
