//! Enrichment column layouts for each upstream service.
//!
//! Every service contributes a fixed set of columns. When enrichment fails the
//! same columns are filled with nulls, so the output schema never depends on
//! which records succeeded.

use crate::record::Fields;

/// The columns one upstream service adds to a record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ServiceSchema {
    pub service: &'static str,
    /// All enrichment columns, in output order.
    pub columns: &'static [&'static str],
    /// Column holding the detail page URL handed to the scraper.
    pub url_column: &'static str,
    /// Column receiving the scraped description.
    pub description_column: &'static str,
    /// Column holding the book title, used as a heading when displayed.
    pub title_column: Option<&'static str>,
    /// Extra columns reported only by single-book lookups, never part of the
    /// batch output shape.
    pub detail_columns: &'static [&'static str],
}

impl ServiceSchema {
    /// The placeholder shape: every enrichment column present and null.
    pub fn defaults(&self) -> Fields {
        self.columns.iter().map(|c| (*c, None)).collect()
    }

    pub fn is_enrichment_column(&self, name: &str) -> bool {
        self.columns.contains(&name)
    }

    pub fn is_detail_column(&self, name: &str) -> bool {
        self.detail_columns.contains(&name)
    }
}

/// Kakao book search (`dapi.kakao.com/v3/search/book`).
pub mod kakao {
    use super::ServiceSchema;

    pub const TITLE: &str = "카카오제목";
    pub const AUTHORS: &str = "카카오작가";
    pub const TRANSLATORS: &str = "카카오번역자";
    pub const ISBN: &str = "카카오ISBN";
    pub const PUBLISHER: &str = "카카오출판사";
    pub const PUBLISHED: &str = "카카오출간일";
    pub const THUMBNAIL: &str = "카카오썸네일";
    pub const URL: &str = "카카오URL";
    pub const DESCRIPTION: &str = "책소개";

    pub const SCHEMA: ServiceSchema = ServiceSchema {
        service: "kakao",
        columns: &[
            TITLE,
            AUTHORS,
            TRANSLATORS,
            ISBN,
            PUBLISHER,
            PUBLISHED,
            THUMBNAIL,
            URL,
            DESCRIPTION,
        ],
        url_column: URL,
        description_column: DESCRIPTION,
        title_column: Some(TITLE),
        detail_columns: &[],
    };
}

/// Aladin TTB open API (`ItemLookUp.aspx` / `ItemSearch.aspx`).
pub mod aladin {
    use super::ServiceSchema;

    pub const COVER: &str = "알라딘표지";
    pub const ISBN13: &str = "알라딘ISBN13";
    pub const DESCRIPTION: &str = "알라딘설명";
    pub const CATEGORY_ID: &str = "알라딘카테고리ID";
    pub const CATEGORY_NAME: &str = "알라딘카테고리명";
    pub const LINK: &str = "알라딘상품링크";
    pub const INTRO: &str = "알라딘책소개";

    // Single-book lookup only.
    pub const TITLE: &str = "알라딘제목";
    pub const ORIGINAL_TITLE: &str = "알라딘원제";
    pub const AUTHOR: &str = "알라딘저자";
    pub const PUBLISHER: &str = "알라딘출판사";
    pub const PUB_DATE: &str = "알라딘출판일";
    pub const ISBN: &str = "알라딘ISBN";
    pub const TOC: &str = "알라딘목차";
    pub const SUBTITLE: &str = "알라딘부가제목";
    pub const COVER_SMALL: &str = "알라딘표지(작은버전)";
    pub const COVER_LARGE: &str = "알라딘표지(큰버전)";

    pub const SCHEMA: ServiceSchema = ServiceSchema {
        service: "aladin",
        columns: &[
            COVER,
            ISBN13,
            DESCRIPTION,
            CATEGORY_ID,
            CATEGORY_NAME,
            LINK,
            INTRO,
        ],
        url_column: LINK,
        description_column: INTRO,
        title_column: Some(TITLE),
        detail_columns: &[
            TITLE,
            ORIGINAL_TITLE,
            SUBTITLE,
            AUTHOR,
            PUBLISHER,
            PUB_DATE,
            ISBN,
            TOC,
            COVER_SMALL,
            COVER_LARGE,
        ],
    };
}

#[cfg(test)]
mod tests {
    use super::{aladin, kakao};

    #[test]
    fn kakao_schema_has_expected_columns() {
        let schema = kakao::SCHEMA;
        assert_eq!(schema.columns.len(), 9);
        assert!(schema.is_enrichment_column(kakao::URL));
        assert!(schema.is_enrichment_column(schema.description_column));
        assert!(!schema.is_enrichment_column("자료명"));
    }

    #[test]
    fn aladin_schema_has_expected_columns() {
        let schema = aladin::SCHEMA;
        assert_eq!(schema.columns.len(), 7);
        assert!(schema.is_enrichment_column(schema.url_column));
    }

    #[test]
    fn detail_columns_stay_out_of_default_shape() {
        let schema = aladin::SCHEMA;
        assert!(schema.is_detail_column(aladin::TITLE));
        assert_eq!(schema.title_column, Some(aladin::TITLE));
        for column in schema.detail_columns {
            assert!(!schema.is_enrichment_column(column));
            assert!(!schema.defaults().contains(column));
        }
    }

    #[test]
    fn defaults_are_all_null_in_schema_order() {
        let defaults = kakao::SCHEMA.defaults();
        let names: Vec<&str> = defaults.names().collect();
        assert_eq!(names, kakao::SCHEMA.columns);
        assert!(defaults.iter().all(|(_, v)| v.is_none()));
    }
}
