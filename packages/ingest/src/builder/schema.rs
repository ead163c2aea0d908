use jsonschema::Validator;
use serde_json::Value;

use crate::error::{IngestError, Result};

const WIZARD_SCHEMA_JSON: &str = include_str!("../../schema/wizard.schema.json");
const GUIDANCE_SCHEMA_JSON: &str = include_str!("../../schema/guidance.schema.json");

/// The fixed contracts payloads are checked against.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PayloadSchema {
    Wizard,
    Guidance,
}

impl PayloadSchema {
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            Self::Wizard => "wizard",
            Self::Guidance => "guidance",
        }
    }

    fn source(&self) -> &'static str {
        match self {
            Self::Wizard => WIZARD_SCHEMA_JSON,
            Self::Guidance => GUIDANCE_SCHEMA_JSON,
        }
    }
}

/// Validates payloads against an embedded JSON schema.
pub struct SchemaValidator {
    schema: PayloadSchema,
    validator: Validator,
}

impl SchemaValidator {
    /// Compile the embedded schema.
    pub fn new(schema: PayloadSchema) -> Result<Self> {
        let document: Value = serde_json::from_str(schema.source())
            .map_err(|e| IngestError::SchemaLoad(format!("{}: {e}", schema.name())))?;

        let validator = Validator::new(&document).map_err(|e| {
            IngestError::SchemaLoad(format!("failed to compile {} schema: {e}", schema.name()))
        })?;

        Ok(Self { schema, validator })
    }

    #[must_use]
    pub fn schema(&self) -> PayloadSchema {
        self.schema
    }

    /// Validate a payload, collecting every violation into one error.
    pub fn validate(&self, value: &Value) -> Result<()> {
        let errors: Vec<String> = self
            .validator
            .iter_errors(value)
            .map(|e| {
                let path = e.instance_path().to_string();
                if path.is_empty() {
                    e.to_string()
                } else {
                    format!("{path}: {e}")
                }
            })
            .collect();

        if errors.is_empty() {
            Ok(())
        } else {
            Err(IngestError::SchemaViolation { errors })
        }
    }
}
