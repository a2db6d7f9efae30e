//! CLI enum types.

use clap::ValueEnum;

use ascii_stream::ascii::DetailLevel;

/// ASCII detail level for rendering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum Detail {
    Low,
    #[default]
    Medium,
    High,
    Ultra,
}

impl From<Detail> for DetailLevel {
    fn from(d: Detail) -> Self {
        match d {
            Detail::Low => DetailLevel::Low,
            Detail::Medium => DetailLevel::Medium,
            Detail::High => DetailLevel::High,
            Detail::Ultra => DetailLevel::Ultra,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_detail_conversion() {
        assert_eq!(DetailLevel::from(Detail::Low), DetailLevel::Low);
        assert_eq!(DetailLevel::from(Detail::Ultra), DetailLevel::Ultra);
        assert_eq!(DetailLevel::from(Detail::default()), DetailLevel::default());
    }
}
