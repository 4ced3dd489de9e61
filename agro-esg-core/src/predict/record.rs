//! Farm-operation record, one row of the sustainability dataset

use super::{PredictError, PredictResult};
use serde::{Deserialize, Serialize};

/// Number of numeric model features
pub const NUMERIC_FEATURES: usize = 13;

/// Column order of the CSV data file
pub const CSV_COLUMNS: [&str; 17] = [
    "ID",
    "EMPRESA",
    "SETOR",
    "USO_AGUA",
    "AREA",
    "AREA_RESERVA",
    "CO2_EMIT_DIR",
    "CO2_EMIT_INDIR",
    "CO2_REC",
    "INSUMO_QUIMICO_LEG",
    "INSUMO_QUIMICO_ORG",
    "BIODIVERSIDADE",
    "RESIDUO_REC",
    "RESIDUO_COMP",
    "RESIDUO_DESC",
    "ENERGIA_REN",
    "INDICE_SUSTENTABILIDADE",
];

/// Farm metrics plus the sustainability index target
///
/// Field order matches [`CSV_COLUMNS`]; serde relies on it when writing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FarmRecord {
    #[serde(rename = "ID")]
    pub id: f64,
    #[serde(rename = "EMPRESA")]
    pub company: String,
    #[serde(rename = "SETOR")]
    pub sector: String,
    #[serde(rename = "USO_AGUA")]
    pub water_use: f64,
    #[serde(rename = "AREA")]
    pub area: f64,
    #[serde(rename = "AREA_RESERVA")]
    pub reserve_area: f64,
    #[serde(rename = "CO2_EMIT_DIR")]
    pub co2_direct: f64,
    #[serde(rename = "CO2_EMIT_INDIR")]
    pub co2_indirect: f64,
    #[serde(rename = "CO2_REC")]
    pub co2_recovered: f64,
    #[serde(rename = "INSUMO_QUIMICO_LEG")]
    pub chemical_inputs_leg: f64,
    #[serde(rename = "INSUMO_QUIMICO_ORG")]
    pub chemical_inputs_org: f64,
    #[serde(rename = "BIODIVERSIDADE")]
    pub biodiversity: f64,
    #[serde(rename = "RESIDUO_REC")]
    pub waste_recycled: f64,
    #[serde(rename = "RESIDUO_COMP")]
    pub waste_composted: f64,
    #[serde(rename = "RESIDUO_DESC")]
    pub waste_discarded: f64,
    #[serde(rename = "ENERGIA_REN")]
    pub renewable_energy: f64,
    #[serde(rename = "INDICE_SUSTENTABILIDADE")]
    pub sustainability_index: f64,
}

impl FarmRecord {
    /// Numeric features in training order (sector excluded)
    pub fn numeric_features(&self) -> [f64; NUMERIC_FEATURES] {
        [
            self.water_use,
            self.area,
            self.reserve_area,
            self.co2_direct,
            self.co2_indirect,
            self.co2_recovered,
            self.chemical_inputs_leg,
            self.chemical_inputs_org,
            self.biodiversity,
            self.waste_recycled,
            self.waste_composted,
            self.waste_discarded,
            self.renewable_energy,
        ]
    }

    /// Copy of this record with the target replaced, rounded to two decimals
    pub fn with_index(&self, index: f64) -> Self {
        Self { sustainability_index: (index * 100.0).round() / 100.0, ..self.clone() }
    }

    /// Check that text fields are present and numbers are finite
    pub fn validate(&self) -> PredictResult<()> {
        if self.company.trim().is_empty() {
            return Err(PredictError::invalid_record("EMPRESA cannot be empty"));
        }
        if self.sector.trim().is_empty() {
            return Err(PredictError::invalid_record("SETOR cannot be empty"));
        }

        let numbers = self.numeric_features();
        let named = CSV_COLUMNS[3..16].iter().zip(numbers.iter());
        for (column, value) in named {
            if !value.is_finite() {
                return Err(PredictError::invalid_record(format!("{} must be a valid number", column)));
            }
        }
        if !self.id.is_finite() || !self.sustainability_index.is_finite() {
            return Err(PredictError::invalid_record("ID and INDICE_SUSTENTABILIDADE must be valid numbers"));
        }

        Ok(())
    }

    /// Reference record used to pre-fill the input form
    pub fn sample() -> Self {
        Self {
            id: 0.0,
            company: "EMPRESA00342".to_string(),
            sector: "TRIGO".to_string(),
            water_use: 5.58,
            area: 8138.78,
            reserve_area: 8.12,
            co2_direct: 5.62,
            co2_indirect: 4.84,
            co2_recovered: 6.12,
            chemical_inputs_leg: 6.83,
            chemical_inputs_org: 5.89,
            biodiversity: 11.13,
            waste_recycled: 12.13,
            waste_composted: 37.62,
            waste_discarded: 14.79,
            renewable_energy: 47.98,
            sustainability_index: 0.58,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sample_is_valid() {
        let record = FarmRecord::sample();
        assert!(record.validate().is_ok());
        assert_eq!(record.numeric_features()[0], 5.58);
        assert_eq!(record.numeric_features()[12], 47.98);
    }

    #[test]
    fn test_validation_errors() {
        let record = FarmRecord { sector: " ".to_string(), ..FarmRecord::sample() };
        assert!(record.validate().unwrap_err().to_string().contains("SETOR"));

        let record = FarmRecord { area: f64::NAN, ..FarmRecord::sample() };
        assert!(record.validate().unwrap_err().to_string().contains("AREA"));

        let record = FarmRecord { renewable_energy: f64::INFINITY, ..FarmRecord::sample() };
        assert!(record.validate().unwrap_err().to_string().contains("ENERGIA_REN"));
    }

    #[test]
    fn test_with_index_rounds() {
        let record = FarmRecord::sample().with_index(0.61789);
        assert_eq!(record.sustainability_index, 0.62);
        assert_eq!(record.company, "EMPRESA00342");
    }
}
