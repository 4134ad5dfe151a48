use super::*;
use crate::classify::CalibrationSlot;
use crate::frame::FrameGroup;
use crate::header::PropertyList;
use crate::params::ParameterEnum;
use crate::sink::MemorySink;
use crate::storage::MemoryStore;
use crate::testing::init_tracing;

const METHOD: &str = "test.stacking.method";
const DARK: CalibrationSlot = CalibrationSlot::MasterDark;

fn test_recipe(corrections: Vec<Correction>, required: Vec<CalibrationSlot>) -> RecipeDefinition {
    RecipeDefinition {
        name: "test_recipe".into(),
        synopsis: "Stack test frames".into(),
        roles: RoleTable::new()
            .raw("TEST_RAW")
            .calibration(DARK, ["MASTER_DARK_TEST"]),
        requirements: Requirements {
            required,
            ..Default::default()
        },
        corrections,
        parameters: ParameterList::new().with(ParameterEnum::new(
            METHOD,
            "test",
            "Stacking method",
            "average",
            ["add", "average", "median", "sigclip"],
        )),
        stacking_parameter: METHOD.into(),
        product: ProductDefinition::final_image("MASTER_TEST"),
        product_key: Template::new("test_recipe"),
        band: None,
    }
}

fn image(rows: &[&[f32]]) -> Image {
    Image::from_rows(rows.iter().map(|r| r.to_vec()))
}

/// Store with raws `r1.fits`, `r2.fits` holding 1 and 3 everywhere.
fn two_raws() -> (Vec<Frame>, MemoryStore) {
    let mut store = MemoryStore::new();
    store.insert_raw(
        "r1.fits",
        PropertyList::new().with("OBJECT", "first"),
        image(&[&[1.0, 1.0], &[1.0, 1.0]]),
    );
    store.insert_raw(
        "r2.fits",
        PropertyList::new().with("OBJECT", "second"),
        image(&[&[3.0, 3.0], &[3.0, 3.0]]),
    );
    let frames = vec![
        Frame::new("r1.fits", "TEST_RAW"),
        Frame::new("r2.fits", "TEST_RAW"),
    ];
    (frames, store)
}

#[test]
fn average_of_two_raws_builds_fixed_category_product() {
    init_tracing();
    let (frames, store) = two_raws();

    let run = test_recipe(vec![], vec![])
        .run(frames, &Settings::new(), &store)
        .unwrap();

    let product = run.product("TEST_RECIPE").unwrap();
    assert_eq!(product.image().pixels(), &[2.0; 4]);
    assert_eq!(product.category(), "MASTER_TEST");
    assert_eq!(product.file_name(), "MASTER_TEST.fits");
    // Header comes from the first raw frame
    assert_eq!(product.header().get_str("OBJECT"), Some("first"));
    assert_eq!(run.parameters().get(METHOD), Some("average"));
}

#[test]
fn classification_is_stamped_on_returned_frames() {
    let (mut frames, store) = two_raws();
    frames.push(Frame::new("notes.txt", "README"));

    let run = test_recipe(vec![], vec![])
        .run(frames, &Settings::new(), &store)
        .unwrap();

    let groups: Vec<FrameGroup> = run.frames().iter().map(Frame::group).collect();
    assert_eq!(groups, vec![FrameGroup::Raw, FrameGroup::Raw, FrameGroup::None]);
    assert_eq!(run.used_frames().len(), 2);
}

#[test]
fn no_raw_frames_means_no_product() {
    let store = MemoryStore::new();
    let frames = vec![Frame::new("dark.fits", "MASTER_DARK_TEST")];

    let err = test_recipe(vec![], vec![])
        .run(frames, &Settings::new(), &store)
        .unwrap_err();

    assert!(matches!(err, Error::NoRawFramesFound));
}

#[test]
fn declared_sigclip_fails_before_arrays_are_loaded() {
    let (frames, store) = two_raws();
    let settings = Settings::new().with(METHOD, "sigclip");

    let err = test_recipe(vec![], vec![])
        .run(frames, &settings, &store)
        .unwrap_err();

    assert!(matches!(err, Error::UnknownStackingMethod(ref m) if m == "sigclip"));
    assert_eq!(store.image_loads(), 0);
}

#[test]
fn undeclared_method_fails_parameter_validation() {
    let (frames, store) = two_raws();
    let settings = Settings::new().with(METHOD, "mode");

    let err = test_recipe(vec![], vec![])
        .run(frames, &settings, &store)
        .unwrap_err();

    assert!(matches!(err, Error::InvalidParameterValue { .. }));
}

#[test]
fn missing_required_dark_aborts() {
    let (frames, store) = two_raws();
    let err = test_recipe(vec![Correction::Subtract(DARK)], vec![DARK])
        .run(frames, &Settings::new(), &store)
        .unwrap_err();
    assert!(matches!(err, Error::MissingCalibrationFrame { slot: DARK }));
}

#[test]
fn dark_is_loaded_once_for_many_raws() {
    let mut store = MemoryStore::new();
    let mut frames = Vec::new();
    for i in 0..6 {
        let file = format!("raw_{i}.fits");
        store.insert_raw(
            file.as_str(),
            PropertyList::new(),
            Image::filled(3, 2, 10.0 + i as f32),
        );
        frames.push(Frame::new(file, "TEST_RAW"));
    }
    store.insert_calibration("dark.fits", Image::filled(3, 2, 10.0));
    frames.push(Frame::new("dark.fits", "MASTER_DARK_TEST"));

    let settings = Settings::new().with(METHOD, "add");
    let run = test_recipe(vec![Correction::Subtract(DARK)], vec![DARK])
        .run(frames, &settings, &store)
        .unwrap();

    // 6 raws + 1 dark
    assert_eq!(store.image_loads(), 7);
    // 0 + 1 + ... + 5
    let product = run.product("TEST_RECIPE").unwrap();
    assert_eq!(product.image().pixels(), &[15.0; 6]);

    let used: Vec<String> = run.used_frames().iter().map(Frame::id).collect();
    assert_eq!(used.last().map(String::as_str), Some("dark.fits"));
    assert_eq!(used[0], "raw_0.fits");
}

#[test]
fn shape_mismatch_between_raw_and_dark_aborts() {
    let (mut frames, mut store) = two_raws();
    store.insert_calibration("dark.fits", Image::filled(4, 4, 0.0));
    frames.push(Frame::new("dark.fits", "MASTER_DARK_TEST"));

    let err = test_recipe(vec![Correction::Subtract(DARK)], vec![DARK])
        .run(frames, &Settings::new(), &store)
        .unwrap_err();

    match err {
        Error::ShapeMismatch { left, right, .. } => {
            assert_eq!(left, "r1.fits");
            assert_eq!(right, "dark.fits");
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn unresolved_product_key_is_invalid_definition() {
    let (frames, store) = two_raws();
    let mut recipe = test_recipe(vec![], vec![]);
    recipe.product_key = Template::new("TEST_{detector}");

    let err = recipe.run(frames, &Settings::new(), &store).unwrap_err();

    assert!(matches!(
        err,
        Error::InvalidProductDefinition(ProductField::Key)
    ));
}

#[test]
fn save_hands_products_to_sink() {
    let (frames, store) = two_raws();
    let run = test_recipe(vec![], vec![])
        .run(frames, &Settings::new(), &store)
        .unwrap();
    let sink = MemorySink::new();

    run.save(&sink).unwrap();

    let saved = sink.saved();
    assert_eq!(saved.len(), 1);
    assert_eq!(saved[0].file_name, "MASTER_TEST.fits");
    assert_eq!(saved[0].recipe, "test_recipe");
    assert_eq!(saved[0].pipeline, PIPELINE);
    assert_eq!(saved[0].header.get_str("ESO PRO CATG"), Some("MASTER_TEST"));
    assert_eq!(saved[0].header.get_str("OBJECT"), Some("first"));

    let product_frames = run.product_frames();
    assert_eq!(product_frames.len(), 1);
    assert_eq!(product_frames[0].tag(), "MASTER_TEST");
    assert_eq!(product_frames[0].group(), FrameGroup::Product);
}
