use std::collections::HashMap;
use std::sync::LazyLock;

use crate::document::{Category, Importance};

/// One controlled section code and what it means.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VocabularyEntry {
    pub code: &'static str,
    pub title: &'static str,
    pub importance: Importance,
    pub category: Category,
    /// Generic placeholder code ("unclassified"); its title never resolves a section.
    pub sentinel: bool,
}

const fn entry(
    code: &'static str,
    title: &'static str,
    importance: Importance,
    category: Category,
) -> VocabularyEntry {
    VocabularyEntry {
        code,
        title,
        importance,
        category,
        sentinel: false,
    }
}

const fn sentinel(code: &'static str, title: &'static str) -> VocabularyEntry {
    VocabularyEntry {
        code,
        title,
        importance: Importance::Low,
        category: Category::Administrative,
        sentinel: true,
    }
}

use Category::*;
use Importance::*;

const ENTRIES: &[VocabularyEntry] = &[
    // Safety
    entry("34066-1", "BOXED WARNING", Critical, Safety),
    entry("34070-3", "CONTRAINDICATIONS", Critical, Safety),
    entry("34071-1", "WARNINGS", Critical, Safety),
    entry("43685-7", "WARNINGS AND PRECAUTIONS", Critical, Safety),
    entry("34088-5", "OVERDOSAGE", Critical, Safety),
    entry("42232-9", "PRECAUTIONS", High, Safety),
    entry("34072-9", "GENERAL PRECAUTIONS", High, Safety),
    entry("34084-4", "ADVERSE REACTIONS", High, Safety),
    entry("34073-7", "DRUG INTERACTIONS", High, Safety),
    entry("34074-5", "DRUG & OR LABORATORY TEST INTERACTIONS", High, Safety),
    entry("34075-2", "LABORATORY TESTS", Medium, Safety),
    entry("43684-0", "USE IN SPECIFIC POPULATIONS", High, Safety),
    entry("42228-7", "PREGNANCY", High, Safety),
    entry("34077-8", "TERATOGENIC EFFECTS", High, Safety),
    entry("34078-6", "NONTERATOGENIC EFFECTS", Medium, Safety),
    entry("34079-4", "LABOR AND DELIVERY", Medium, Safety),
    entry("34080-2", "NURSING MOTHERS", High, Safety),
    entry("77290-5", "LACTATION", High, Safety),
    entry("77291-3", "FEMALES AND MALES OF REPRODUCTIVE POTENTIAL", Medium, Safety),
    entry("34081-0", "PEDIATRIC USE", High, Safety),
    entry("34082-8", "GERIATRIC USE", High, Safety),
    entry("42227-9", "DRUG ABUSE AND DEPENDENCE", High, Safety),
    entry("34085-1", "CONTROLLED SUBSTANCE", Medium, Safety),
    entry("34086-9", "ABUSE", Medium, Safety),
    entry("34087-7", "DEPENDENCE", Medium, Safety),
    entry("43680-8", "NONCLINICAL TOXICOLOGY", Medium, Safety),
    entry(
        "34083-6",
        "CARCINOGENESIS AND MUTAGENESIS AND IMPAIRMENT OF FERTILITY",
        Medium,
        Safety,
    ),
    entry("34091-9", "ANIMAL PHARMACOLOGY AND/OR TOXICOLOGY", Low, Safety),
    entry("60561-8", "OTHER SAFETY INFORMATION", Medium, Safety),
    // Dosing
    entry("34068-7", "DOSAGE AND ADMINISTRATION", Critical, Dosing),
    entry("43678-2", "DOSAGE FORMS AND STRENGTHS", High, Dosing),
    // Efficacy
    entry("34067-9", "INDICATIONS AND USAGE", High, Efficacy),
    entry("34090-1", "CLINICAL PHARMACOLOGY", Medium, Efficacy),
    entry("43679-0", "MECHANISM OF ACTION", Medium, Efficacy),
    entry("43681-6", "PHARMACODYNAMICS", Medium, Efficacy),
    entry("43682-4", "PHARMACOKINETICS", Medium, Efficacy),
    entry("34092-7", "CLINICAL STUDIES", Medium, Efficacy),
    // Description
    entry("34089-3", "DESCRIPTION", Medium, Description),
    entry("88436-1", "PATIENT COUNSELING INFORMATION", Medium, Description),
    entry("34076-0", "INFORMATION FOR PATIENTS", Medium, Description),
    entry("42230-3", "PATIENT PACKAGE INSERT", Medium, Description),
    entry("42231-1", "MEDICATION GUIDE", Medium, Description),
    entry("59845-8", "INSTRUCTIONS FOR USE", Medium, Description),
    entry("55106-9", "ACTIVE INGREDIENT", Medium, Description),
    entry("51727-6", "INACTIVE INGREDIENT", Low, Description),
    // Administrative
    entry("34069-5", "HOW SUPPLIED/STORAGE AND HANDLING", Low, Administrative),
    entry("44425-7", "STORAGE AND HANDLING", Low, Administrative),
    entry("51945-4", "PACKAGE LABEL.PRINCIPAL DISPLAY PANEL", Low, Administrative),
    entry("43683-2", "RECENT MAJOR CHANGES", Medium, Administrative),
    entry("34093-5", "REFERENCES", Low, Administrative),
    entry("48779-3", "SPL INDEXING DATA ELEMENTS", Low, Administrative),
    entry("48780-1", "SPL PRODUCT DATA ELEMENTS", Low, Administrative),
    entry("53413-1", "QUESTIONS", Low, Administrative),
    sentinel("42229-5", "SPL UNCLASSIFIED SECTION"),
];

static REGISTRY: LazyLock<HashMap<&'static str, &'static VocabularyEntry>> =
    LazyLock::new(|| ENTRIES.iter().map(|e| (e.code, e)).collect());

/// Look up a controlled code. Sentinel entries are returned too; check `sentinel`.
pub fn resolve(code: &str) -> Option<&'static VocabularyEntry> {
    REGISTRY.get(code.trim()).copied()
}

/// Canonical title for a code, unless the code is unknown or a sentinel.
pub fn canonical_title(code: &str) -> Option<&'static str> {
    resolve(code).filter(|e| !e.sentinel).map(|e| e.title)
}

/// Importance and category for a code, unless the code is unknown or a sentinel.
pub fn classify(code: &str) -> Option<(Importance, Category)> {
    resolve(code)
        .filter(|e| !e.sentinel)
        .map(|e| (e.importance, e.category))
}

pub fn len() -> usize {
    REGISTRY.len()
}
