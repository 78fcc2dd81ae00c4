//! Context assembly for analysis prompts.
//!
//! Renders retrieved incident records into a text block and wraps it,
//! together with the user query, in the analyst prompt whose response
//! format the parser in [`crate::parse`] understands.

use std::fmt::Write as _;

use crime_rag_models::{ContextMode, SimilarityMatch};

/// At most this many retrieved records are rendered into the prompt,
/// regardless of how many the retriever returned.
pub const MAX_CONTEXT_RECORDS: usize = 10;

/// Renders the matched records into the context block of the prompt.
///
/// `FullContext` renders every attribute of each record; `Summary`
/// renders only the crime type, location, and date. Records beyond
/// [`MAX_CONTEXT_RECORDS`] are dropped. An empty match list yields an
/// explicit no-records line rather than an empty string.
#[must_use]
pub fn build_context(matches: &[SimilarityMatch], mode: ContextMode) -> String {
    if matches.is_empty() {
        return "No matching historical records were found.".to_string();
    }

    let mut out = String::new();

    for (i, m) in matches.iter().take(MAX_CONTEXT_RECORDS).enumerate() {
        let r = &m.record;
        if i > 0 {
            out.push('\n');
        }
        let _ = writeln!(out, "Record {}:", i + 1);
        match mode {
            ContextMode::FullContext => {
                let _ = writeln!(out, "Crime Type: {}", r.crime_type);
                let _ = writeln!(
                    out,
                    "Location: {} at coordinates ({}, {})",
                    r.neighborhood, r.latitude, r.longitude
                );
                let _ = writeln!(
                    out,
                    "Date and Time: {}, {}",
                    r.date.format("%A, %B %d, %Y"),
                    r.time_of_day
                );
                let _ = writeln!(
                    out,
                    "Weather: {}, Temperature: {:.1}\u{b0}C, {}",
                    r.weather, r.temperature, r.lighting
                );
                let _ = writeln!(
                    out,
                    "Population Density: {:.1}, Average Income: {:.1}, Unemployment Rate: {:.1}%",
                    r.population_density, r.average_income, r.unemployment_rate
                );
            }
            ContextMode::Summary => {
                let _ = writeln!(
                    out,
                    "{} in {} on {}",
                    r.crime_type,
                    r.neighborhood,
                    r.date.format("%A, %B %d, %Y")
                );
            }
        }
    }

    out
}

/// Builds the full analyst prompt from a rendered context block and the
/// user's query.
///
/// The response format instructions here must stay in sync with the
/// labeled-field extractor in [`crate::parse`].
#[must_use]
pub fn build_prompt(query: &str, context: &str) -> String {
    format!(
        "You are CrimeAnalyst-GPT, an expert crime data analyst. Using only the \
         historical crime records below, assess the situation described in the query.\n\
         \n\
         HISTORICAL CRIME RECORDS:\n\
         {context}\n\
         \n\
         QUERY: {query}\n\
         \n\
         Respond in exactly this format:\n\
         1. CRIME PROBABILITY: <percentage>\n\
         2. MOST LIKELY CRIME TYPE: <distribution> (e.g. Theft(60%), Assault(20%))\n\
         3. KEY FACTORS: <comma-separated contributing factors>\n\
         4. RISK LEVEL: <Low/Moderate/High/Very High>"
    )
}

#[cfg(test)]
mod tests {
    use std::str::FromStr as _;

    use chrono::NaiveDate;
    use crime_rag_models::{IncidentRecord, TimeOfDay};

    use super::*;

    fn hit(id: &str, score: f64) -> SimilarityMatch {
        SimilarityMatch {
            record: IncidentRecord {
                id: id.to_string(),
                crime_type: "Theft".to_string(),
                neighborhood: "Downtown".to_string(),
                latitude: 40.71,
                longitude: -74.0,
                date: NaiveDate::from_str("2024-03-15").unwrap(),
                time_of_day: TimeOfDay::Night,
                weather: "Rainy".to_string(),
                temperature: 12.34,
                lighting: "Poorly-lit".to_string(),
                population_density: 5000.0,
                average_income: 42_000.0,
                unemployment_rate: 7.5,
            },
            score,
        }
    }

    #[test]
    fn full_context_renders_all_attributes() {
        let context = build_context(&[hit("0", 0.9)], ContextMode::FullContext);
        assert!(context.contains("Record 1:"));
        assert!(context.contains("Crime Type: Theft"));
        assert!(context.contains("Location: Downtown at coordinates (40.71, -74)"));
        assert!(context.contains("Date and Time: Friday, March 15, 2024, Night"));
        assert!(context.contains("Temperature: 12.3\u{b0}C"));
        assert!(context.contains("Unemployment Rate: 7.5%"));
    }

    #[test]
    fn summary_renders_only_type_location_date() {
        let context = build_context(&[hit("0", 0.9)], ContextMode::Summary);
        assert!(context.contains("Theft in Downtown on Friday, March 15, 2024"));
        assert!(!context.contains("Weather"));
        assert!(!context.contains("Population Density"));
    }

    #[test]
    fn context_caps_record_count() {
        let matches: Vec<SimilarityMatch> =
            (0..15).map(|i| hit(&i.to_string(), 0.5)).collect();
        let context = build_context(&matches, ContextMode::Summary);
        assert!(context.contains("Record 10:"));
        assert!(!context.contains("Record 11:"));
    }

    #[test]
    fn empty_matches_yield_placeholder() {
        let context = build_context(&[], ContextMode::FullContext);
        assert_eq!(context, "No matching historical records were found.");
    }

    #[test]
    fn prompt_embeds_query_and_format_instructions() {
        let prompt = build_prompt("theft at night downtown", "Record 1:\n...");
        assert!(prompt.contains("CrimeAnalyst-GPT"));
        assert!(prompt.contains("QUERY: theft at night downtown"));
        assert!(prompt.contains("1. CRIME PROBABILITY:"));
        assert!(prompt.contains("4. RISK LEVEL:"));
    }
}
