//! Channel template resolution.
//!
//! A template maps semantic catalog fields to the column layout one sales
//! channel expects. Definitions live either as
//! `{channel}_{template_type}.{yaml|yml|json}` files under the configured
//! template directory or as rows in `sales_channel_templates`; the file wins
//! when both exist. Loading is idempotent and performs no writes.

use std::path::{Path, PathBuf};

use sea_orm::{ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter};
use serde_json::Value;
use tracing::{debug, instrument};

use crate::entities::sales_channel_template;
use crate::errors::ServiceError;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TemplateColumn {
    pub header: String,
    pub field: String,
    pub required: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChannelTemplate {
    pub channel: String,
    pub template_type: String,
    pub columns: Vec<TemplateColumn>,
    pub locale: Option<String>,
}

impl ChannelTemplate {
    /// Validates a parsed template payload. Each rule yields its own
    /// message so a misconfigured template names the offending column.
    pub fn from_value(
        data: &Value,
        channel: &str,
        template_type: &str,
    ) -> Result<Self, ServiceError> {
        let map = data.as_object().ok_or_else(|| {
            ServiceError::TemplateInvalid(format!(
                "Template {}/{} must be a mapping of settings",
                channel, template_type
            ))
        })?;

        let columns_data = map
            .get("columns")
            .and_then(Value::as_array)
            .filter(|cols| !cols.is_empty())
            .ok_or_else(|| {
                ServiceError::TemplateInvalid(format!(
                    "Template {}/{} must define a non-empty 'columns' list",
                    channel, template_type
                ))
            })?;

        let mut columns = Vec::with_capacity(columns_data.len());
        for (idx, col) in columns_data.iter().enumerate() {
            let col = col.as_object().ok_or_else(|| {
                ServiceError::TemplateInvalid(format!(
                    "Template {}/{} column #{} must be an object",
                    channel,
                    template_type,
                    idx + 1
                ))
            })?;

            let header = col
                .get("header")
                .and_then(Value::as_str)
                .filter(|s| !s.is_empty())
                .ok_or_else(|| {
                    ServiceError::TemplateInvalid(format!(
                        "Template {}/{} column #{} is missing a 'header'",
                        channel,
                        template_type,
                        idx + 1
                    ))
                })?;

            let field = col
                .get("field")
                .and_then(Value::as_str)
                .filter(|s| !s.is_empty())
                .ok_or_else(|| {
                    ServiceError::TemplateInvalid(format!(
                        "Template {}/{} column '{}' is missing a 'field'",
                        channel, template_type, header
                    ))
                })?;

            let required = col.get("required").and_then(Value::as_bool).unwrap_or(false);

            columns.push(TemplateColumn {
                header: header.to_string(),
                field: field.to_string(),
                required,
            });
        }

        let locale = map
            .get("locale")
            .and_then(Value::as_str)
            .map(str::to_string);

        Ok(Self {
            channel: channel.to_string(),
            template_type: template_type.to_string(),
            columns,
            locale,
        })
    }

    /// The built-in SmartStore catalog layout. Header labels are the exact
    /// strings the channel's bulk-upload tooling expects.
    pub fn smartstore_default() -> Self {
        let columns = [
            ("상품명", "title"),
            ("판매가", "price"),
            ("재고수량", "stock"),
            ("옵션명", "option_name"),
            ("옵션값", "option_value"),
            ("상세설명", "description"),
            ("대표이미지URL", "main_image"),
        ]
        .into_iter()
        .map(|(header, field)| TemplateColumn {
            header: header.to_string(),
            field: field.to_string(),
            required: false,
        })
        .collect();

        Self {
            channel: "smartstore".to_string(),
            template_type: "default".to_string(),
            columns,
            locale: Some("ko-KR".to_string()),
        }
    }
}

#[derive(Debug, Clone)]
pub struct ChannelTemplateLoader {
    base_path: PathBuf,
}

impl ChannelTemplateLoader {
    pub fn new(base_path: impl Into<PathBuf>) -> Self {
        Self {
            base_path: base_path.into(),
        }
    }

    /// Resolves a template for (channel, template_type), case-insensitive on
    /// both keys: file store first, then the database when a connection is
    /// given, else `TemplateNotFound`.
    #[instrument(skip(self, db))]
    pub async fn load(
        &self,
        channel: &str,
        template_type: &str,
        db: Option<&DatabaseConnection>,
    ) -> Result<ChannelTemplate, ServiceError> {
        let channel = channel.to_lowercase();
        let template_type = template_type.to_lowercase();

        if let Some(template) = self.load_from_files(&channel, &template_type)? {
            debug!(channel = %channel, template_type = %template_type, "Template resolved from file");
            return Ok(template);
        }

        if let Some(db) = db {
            if let Some(template) = self.load_from_database(&channel, &template_type, db).await? {
                debug!(channel = %channel, template_type = %template_type, "Template resolved from database");
                return Ok(template);
            }
        }

        Err(ServiceError::TemplateNotFound {
            channel,
            template_type,
        })
    }

    fn load_from_files(
        &self,
        channel: &str,
        template_type: &str,
    ) -> Result<Option<ChannelTemplate>, ServiceError> {
        let base_name = format!("{}_{}", channel, template_type);
        for extension in ["yaml", "yml", "json"] {
            let candidate = self.base_path.join(format!("{}.{}", base_name, extension));
            if candidate.exists() {
                return self
                    .parse_file(&candidate, channel, template_type)
                    .map(Some);
            }
        }
        Ok(None)
    }

    fn parse_file(
        &self,
        path: &Path,
        channel: &str,
        template_type: &str,
    ) -> Result<ChannelTemplate, ServiceError> {
        let raw = std::fs::read_to_string(path).map_err(|e| ServiceError::TemplateParseError {
            channel: channel.to_string(),
            template_type: template_type.to_string(),
            detail: e.to_string(),
        })?;

        let is_yaml = matches!(
            path.extension().and_then(|ext| ext.to_str()),
            Some("yaml") | Some("yml")
        );
        let data: Value = if is_yaml {
            serde_yaml::from_str(&raw).map_err(|e| ServiceError::TemplateParseError {
                channel: channel.to_string(),
                template_type: template_type.to_string(),
                detail: e.to_string(),
            })?
        } else {
            serde_json::from_str(&raw).map_err(|e| ServiceError::TemplateParseError {
                channel: channel.to_string(),
                template_type: template_type.to_string(),
                detail: e.to_string(),
            })?
        };

        ChannelTemplate::from_value(&data, channel, template_type)
    }

    async fn load_from_database(
        &self,
        channel: &str,
        template_type: &str,
        db: &DatabaseConnection,
    ) -> Result<Option<ChannelTemplate>, ServiceError> {
        let row = sales_channel_template::Entity::find()
            .filter(sales_channel_template::Column::ChannelName.eq(channel))
            .filter(sales_channel_template::Column::TemplateType.eq(template_type))
            .one(db)
            .await?;

        let Some(row) = row else {
            return Ok(None);
        };

        let data: Value =
            serde_json::from_str(&row.config_json).map_err(|e| ServiceError::TemplateParseError {
                channel: channel.to_string(),
                template_type: template_type.to_string(),
                detail: format!("database row is invalid JSON: {}", e),
            })?;

        ChannelTemplate::from_value(&data, channel, template_type).map(Some)
    }
}
