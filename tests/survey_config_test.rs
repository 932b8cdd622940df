use geovity::domain::ports::ConfigProvider;
use geovity::utils::validation::Validate;
use geovity::{
    AnomalyMapPipeline, CliShell, CorrectionPipeline, LocalStorage, SurveyConfig, SurveyEngine,
};
use std::path::PathBuf;
use tempfile::TempDir;

#[tokio::test]
async fn test_survey_file_drives_both_stages() -> anyhow::Result<()> {
    let temp_dir = TempDir::new()?;
    let dir = temp_dir.path();
    std::fs::write(
        dir.join("stations.csv"),
        "Site,LatitudeUTM,LongitudeUTM,elevation,ObsGravity\n\
         A,-33.40,-70.70,510.0,979420.0\n\
         B,-33.40,-70.60,640.0,979398.5\n\
         C,-33.50,-70.70,590.0,979405.2\n\
         D,-33.50,-70.60,705.0,979380.9\n",
    )?;

    std::env::set_var("GEOVITY_IT_SURVEY_DIR", dir.display().to_string());
    let config = SurveyConfig::from_toml_str(
        r#"
[survey]
name = "integration"

[io]
raw_input = "${GEOVITY_IT_SURVEY_DIR}/stations.csv"
corrected_output = "${GEOVITY_IT_SURVEY_DIR}/corrected.csv"
map_output = "${GEOVITY_IT_SURVEY_DIR}/anomaly.png"

[correction]
density = 2.3

[map]
grid_resolution = 30
dpi = 15
contour_levels = 8
"#,
    )?;
    std::env::remove_var("GEOVITY_IT_SURVEY_DIR");

    config.validate()?;
    assert_eq!(config.correction_settings().density, 2.3);
    let settings = config.settings();

    let mut shell = CliShell::new(
        Some(PathBuf::from(&config.io.raw_input)),
        Some(PathBuf::from(&config.io.corrected_output)),
    );
    let correction =
        SurveyEngine::new(CorrectionPipeline::new(LocalStorage::default(), settings.clone()));
    assert!(correction.run(&mut shell).await.is_completed());

    let mut shell = CliShell::new(
        Some(PathBuf::from(&config.io.corrected_output)),
        config.io.map_output.as_ref().map(PathBuf::from),
    );
    let map = SurveyEngine::new(AnomalyMapPipeline::new(LocalStorage::default(), settings));
    assert!(map.run(&mut shell).await.is_completed());

    assert!(dir.join("corrected.csv").exists());
    assert!(dir.join("anomaly.png").exists());
    assert_eq!(shell.failures(), 0);

    Ok(())
}

#[test]
fn test_invalid_survey_file_is_rejected() {
    let config = SurveyConfig::from_toml_str(
        r#"
[survey]
name = "bad"

[io]
raw_input = "stations.csv"
corrected_output = "corrected.csv"

[map]
dpi = 0
"#,
    )
    .unwrap();

    let err = config.validate().unwrap_err();
    assert!(err.to_string().contains("map.dpi"));
}
