use serde::{Deserialize, Serialize};

use crate::error::SourceError;

/// 阿拉伯语原文 + 英文译文
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, utoipa::ToSchema)]
pub struct BilingualText {
    #[schema(example = "بِسْمِ اللَّهِ الرَّحْمَٰنِ الرَّحِيمِ")]
    pub arabic: String,
    #[schema(example = "In the name of Allah, the Entirely Merciful, the Especially Merciful.")]
    pub english: String,
}

/// 一条经文记录（可附带圣训摘录）
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, utoipa::ToSchema)]
pub struct VerseRecord {
    /// 章号
    #[schema(example = 1)]
    pub surah: u32,
    /// 节号
    #[schema(example = 1)]
    pub ayah: u32,
    pub text: BilingualText,
    /// 圣训摘录（可选）
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hadith: Option<BilingualText>,
}

impl VerseRecord {
    /// 从数据源的原始条目解析（缺字段或类型不符视为数据不可用）
    pub fn from_value(raw: serde_json::Value) -> Result<Self, SourceError> {
        Ok(serde_json::from_value(raw)?)
    }

    /// 出处行，例如 `Surah 2, Ayah 255`
    pub fn citation(&self) -> String {
        format!("Surah {}, Ayah {}", self.surah, self.ayah)
    }
}
