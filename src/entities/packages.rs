use chrono::{DateTime, Utc};
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

use crate::billing::PackageMeta;

/// 课程套餐目录（只读参考数据）
/// - session_count: 套餐包含的课时数（每周一节）
/// - duration_days: 按天计的有效期，NULL 时按 30 天计算缴费日
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq, Serialize, Deserialize)]
#[sea_orm(table_name = "packages")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    pub name: String,
    pub session_count: i32,
    pub duration_days: Option<i32>,
    pub price_cents: i64,
    pub is_active: bool,
    pub created_at: Option<DateTime<Utc>>,
}

impl Model {
    pub fn meta(&self) -> PackageMeta {
        PackageMeta {
            duration_days: self.duration_days.map(i64::from),
        }
    }
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
