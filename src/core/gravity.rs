//! Latitude and simplified Bouguer corrections.
//!
//! Normal gravity uses the closed-form GRS80 (Somigliana) expression; the
//! Bouguer step is a single infinite-slab correction at a fixed crustal
//! density. Terrain, tide and drift corrections are not applied.

use crate::domain::model::{columns, CorrectionSettings, GravityCorrection, StationTable};
use crate::utils::error::{Result, SurveyError};
use rayon::prelude::*;

/// Equatorial normal gravity of GRS80.
pub const GRS80_EQUATORIAL_GRAVITY: f64 = 9.7803267714;
const GRS80_SOMIGLIANA_K: f64 = 0.00193185138639;
const GRS80_FIRST_ECCENTRICITY_SQ: f64 = 0.00669437999013;

/// Free-air gradient, mGal per metre.
pub const FREE_AIR_GRADIENT: f64 = 0.3086;
/// Slab term per metre per g/cm³ (2πG).
pub const BOUGUER_PLATE_CONSTANT: f64 = 0.04193;

/// Normal gravity at a latitude given in degrees. No range check is made.
pub fn normal_gravity(latitude_deg: f64) -> f64 {
    let sin2 = latitude_deg.to_radians().sin().powi(2);
    GRS80_EQUATORIAL_GRAVITY * (1.0 + GRS80_SOMIGLIANA_K * sin2)
        / (1.0 - GRS80_FIRST_ECCENTRICITY_SQ * sin2).sqrt()
}

pub fn bouguer_gravity(observed_gravity: f64, elevation: f64, density: f64) -> f64 {
    observed_gravity - elevation * FREE_AIR_GRADIENT + BOUGUER_PLATE_CONSTANT * density * elevation
}

pub fn bouguer_anomaly(observed_gravity: f64, normal: f64, bouguer: f64) -> f64 {
    observed_gravity - normal - bouguer
}

pub fn correct_station(
    latitude_deg: f64,
    elevation: f64,
    observed_gravity: f64,
    density: f64,
) -> GravityCorrection {
    let normal = normal_gravity(latitude_deg);
    let bouguer = bouguer_gravity(observed_gravity, elevation, density);

    GravityCorrection {
        normal_gravity: normal,
        bouguer_gravity: bouguer,
        bouguer_anomaly: bouguer_anomaly(observed_gravity, normal, bouguer),
    }
}

/// Returns a copy of `table` with `Grav_Normal`, `Grav_Bouguer` and
/// `Anomalia_Bouguer` populated for every station.
///
/// Any missing column or unparsable cell in `LatitudeUTM`, `elevation` or
/// `ObsGravity` fails the whole table; no station is skipped.
pub fn correct_table(table: &StationTable, settings: &CorrectionSettings) -> Result<StationTable> {
    if table.is_empty() {
        return Err(SurveyError::EmptyTableError);
    }

    let latitudes = table.numeric_column(columns::LATITUDE)?;
    let elevations = table.numeric_column(columns::ELEVATION)?;
    let observed = table.numeric_column(columns::OBSERVED_GRAVITY)?;

    let corrections: Vec<GravityCorrection> = latitudes
        .par_iter()
        .zip(elevations.par_iter())
        .zip(observed.par_iter())
        .map(|((&lat, &elev), &obs)| correct_station(lat, elev, obs, settings.density))
        .collect();

    let normal: Vec<f64> = corrections.iter().map(|c| c.normal_gravity).collect();
    let bouguer: Vec<f64> = corrections.iter().map(|c| c.bouguer_gravity).collect();
    let anomaly: Vec<f64> = corrections.iter().map(|c| c.bouguer_anomaly).collect();

    let mut corrected = table.clone();
    corrected.set_numeric_column(columns::NORMAL_GRAVITY, &normal);
    corrected.set_numeric_column(columns::BOUGUER_GRAVITY, &bouguer);
    corrected.set_numeric_column(columns::BOUGUER_ANOMALY, &anomaly);

    tracing::debug!(
        "Corrected {} stations (density {} g/cm³)",
        corrected.len(),
        settings.density
    );

    Ok(corrected)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn raw_table(rows: &[[&str; 5]]) -> StationTable {
        StationTable::new(
            columns::RAW_SCHEMA.iter().map(|c| c.to_string()).collect(),
            rows.iter()
                .map(|row| row.iter().map(|c| c.to_string()).collect())
                .collect(),
        )
    }

    #[test]
    fn test_normal_gravity_at_equator_is_equatorial_constant() {
        assert_eq!(normal_gravity(0.0), 9.7803267714);
    }

    #[test]
    fn test_normal_gravity_is_symmetric() {
        for lat in [-90.0, -63.2, -12.0, 0.5, 33.3, 45.0, 89.9, 90.0] {
            assert_eq!(normal_gravity(lat), normal_gravity(-lat));
            assert_relative_eq!(normal_gravity(lat), normal_gravity(180.0 - lat), epsilon = 1e-12);
        }
    }

    #[test]
    fn test_normal_gravity_at_pole() {
        assert_relative_eq!(normal_gravity(90.0), 9.8321863685, epsilon = 1e-9);
    }

    #[test]
    fn test_out_of_range_latitude_is_evaluated() {
        assert!(normal_gravity(4_500_000.0).is_finite());
    }

    #[test]
    fn test_zero_elevation_leaves_observed_gravity() {
        for obs in [0.0, 978_031.5, -12.75, 980_000.0] {
            assert_eq!(bouguer_gravity(obs, 0.0, 2.67), obs);
        }
    }

    #[test]
    fn test_bouguer_gravity_terms() {
        let b = bouguer_gravity(1000.0, 100.0, 2.67);
        assert_relative_eq!(b, 1000.0 - 30.86 + 0.04193 * 2.67 * 100.0, epsilon = 1e-12);
    }

    #[test]
    fn test_two_equatorial_stations() {
        let table = raw_table(&[
            ["A", "0", "0", "0", "980000"],
            ["B", "0", "0", "0", "980000"],
        ]);

        let corrected = correct_table(&table, &CorrectionSettings::default()).unwrap();

        for value in corrected.numeric_column(columns::NORMAL_GRAVITY).unwrap() {
            assert_eq!(value, 9.7803267714);
        }
        for value in corrected.numeric_column(columns::BOUGUER_GRAVITY).unwrap() {
            assert_eq!(value, 980000.0);
        }
        for value in corrected.numeric_column(columns::BOUGUER_ANOMALY).unwrap() {
            assert_relative_eq!(value, -9.7803267714, epsilon = 1e-9);
        }
    }

    #[test]
    fn test_derived_columns_are_appended_in_order() {
        let table = raw_table(&[["S1", "10.5", "-70.2", "120", "978100.3"]]);
        let corrected = correct_table(&table, &CorrectionSettings::default()).unwrap();

        let headers: Vec<&str> = corrected.headers().iter().map(String::as_str).collect();
        assert_eq!(
            headers,
            vec![
                "Site",
                "LatitudeUTM",
                "LongitudeUTM",
                "elevation",
                "ObsGravity",
                "Grav_Normal",
                "Grav_Bouguer",
                "Anomalia_Bouguer"
            ]
        );
        assert_eq!(corrected.rows()[0][..5], table.rows()[0][..]);
    }

    #[test]
    fn test_rerun_on_corrected_table_is_stable() {
        let table = raw_table(&[
            ["S1", "10.5", "-70.2", "120", "978100.3"],
            ["S2", "-33.1", "-70.9", "2400.5", "977650.25"],
        ]);
        let settings = CorrectionSettings::default();
        let once = correct_table(&table, &settings).unwrap();
        let twice = correct_table(&once, &settings).unwrap();
        assert_eq!(once, twice);
    }

    #[test]
    fn test_missing_elevation_fails() {
        let table = StationTable::new(
            vec!["Site".into(), "LatitudeUTM".into(), "ObsGravity".into()],
            vec![vec!["A".into(), "1".into(), "2".into()]],
        );
        let err = correct_table(&table, &CorrectionSettings::default()).unwrap_err();
        assert!(matches!(err, SurveyError::MissingColumnError { ref column } if column == "elevation"));
    }

    #[test]
    fn test_non_numeric_gravity_fails_whole_table() {
        let table = raw_table(&[
            ["S1", "10", "1", "5", "978000"],
            ["S2", "10", "1", "5", ""],
        ]);
        let err = correct_table(&table, &CorrectionSettings::default()).unwrap_err();
        assert!(matches!(err, SurveyError::InvalidValueError { row: 2, .. }));
    }

    #[test]
    fn test_empty_table_fails() {
        let table = raw_table(&[]);
        assert!(matches!(
            correct_table(&table, &CorrectionSettings::default()),
            Err(SurveyError::EmptyTableError)
        ));
    }
}
