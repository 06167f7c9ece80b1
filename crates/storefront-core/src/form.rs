//! Buyer Form
//!
//! Questionnaire answers plus the chosen package. Values are accepted as-is
//! on entry and only checked when the form is submitted.

use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::catalog::{Package, PackageCatalog};
use crate::error::{Result, StorefrontError};

/// Addressable form fields, in display order
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FormField {
    Name,
    Email,
    Skills,
    Passion,
    WeeklyTime,
    TargetIncome,
    Experience,
    Package,
}

impl FormField {
    /// Every field the buyer types or picks directly
    pub const INPUTS: [Self; 7] = [
        Self::Name,
        Self::Email,
        Self::Skills,
        Self::Passion,
        Self::WeeklyTime,
        Self::TargetIncome,
        Self::Experience,
    ];

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Name => "name",
            Self::Email => "email",
            Self::Skills => "skills",
            Self::Passion => "passion",
            Self::WeeklyTime => "weekly_time",
            Self::TargetIncome => "target_income",
            Self::Experience => "experience",
            Self::Package => "package",
        }
    }

    /// Field name in the backend's `user_form` payload
    pub const fn wire_name(self) -> &'static str {
        match self {
            Self::Name => "prenom",
            Self::Email => "email",
            Self::Skills => "competences",
            Self::Passion => "passion",
            Self::WeeklyTime => "temps_semaine",
            Self::TargetIncome => "revenu_vise",
            Self::Experience => "niveau_experience",
            Self::Package => "version_choisie",
        }
    }

    /// Comma-separated field names
    pub fn join(fields: &[Self]) -> String {
        fields
            .iter()
            .map(|f| f.as_str())
            .collect::<Vec<_>>()
            .join(", ")
    }
}

impl fmt::Display for FormField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for FormField {
    type Err = StorefrontError;

    /// Accepts both the English names and the backend's wire names
    fn from_str(s: &str) -> Result<Self> {
        let name = s.trim();
        Self::INPUTS
            .into_iter()
            .chain([Self::Package])
            .find(|f| f.as_str() == name || f.wire_name() == name)
            .ok_or_else(|| StorefrontError::UnknownField(s.to_string()))
    }
}

/// A closed set of options presented as a dropdown
pub trait Choice: Sized + Copy + 'static {
    /// All options, in display order
    const ALL: &'static [Self];

    /// Display label, identical to the value sent to the backend
    fn label(self) -> &'static str;

    fn from_label(label: &str) -> Option<Self> {
        let label = label.trim();
        Self::ALL.iter().copied().find(|c| c.label() == label)
    }
}

/// Hours per week the buyer can commit
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum WeeklyTime {
    #[serde(rename = "2-5 heures")]
    TwoToFive,
    #[serde(rename = "5-10 heures")]
    FiveToTen,
    #[serde(rename = "10-20 heures")]
    TenToTwenty,
    #[serde(rename = "20+ heures")]
    TwentyPlus,
}

impl Choice for WeeklyTime {
    const ALL: &'static [Self] = &[
        Self::TwoToFive,
        Self::FiveToTen,
        Self::TenToTwenty,
        Self::TwentyPlus,
    ];

    fn label(self) -> &'static str {
        match self {
            Self::TwoToFive => "2-5 heures",
            Self::FiveToTen => "5-10 heures",
            Self::TenToTwenty => "10-20 heures",
            Self::TwentyPlus => "20+ heures",
        }
    }
}

/// Monthly income the buyer is aiming for
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum TargetIncome {
    #[serde(rename = "500-1000€")]
    UpToThousand,
    #[serde(rename = "1000-3000€")]
    UpToThreeThousand,
    #[serde(rename = "3000-5000€")]
    UpToFiveThousand,
    #[serde(rename = "5000€+")]
    AboveFiveThousand,
}

impl Choice for TargetIncome {
    const ALL: &'static [Self] = &[
        Self::UpToThousand,
        Self::UpToThreeThousand,
        Self::UpToFiveThousand,
        Self::AboveFiveThousand,
    ];

    fn label(self) -> &'static str {
        match self {
            Self::UpToThousand => "500-1000€",
            Self::UpToThreeThousand => "1000-3000€",
            Self::UpToFiveThousand => "3000-5000€",
            Self::AboveFiveThousand => "5000€+",
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Experience {
    #[serde(rename = "Débutant")]
    Beginner,
    #[serde(rename = "Confirmé")]
    Confirmed,
}

impl Choice for Experience {
    const ALL: &'static [Self] = &[Self::Beginner, Self::Confirmed];

    fn label(self) -> &'static str {
        match self {
            Self::Beginner => "Débutant",
            Self::Confirmed => "Confirmé",
        }
    }
}

/// Form snapshot in the backend's `user_form` shape
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserForm {
    #[serde(rename = "prenom")]
    pub name: String,
    pub email: String,
    #[serde(rename = "competences")]
    pub skills: String,
    pub passion: String,
    #[serde(rename = "temps_semaine")]
    pub weekly_time: WeeklyTime,
    #[serde(rename = "revenu_vise")]
    pub target_income: TargetIncome,
    #[serde(rename = "niveau_experience")]
    pub experience: Experience,
    #[serde(rename = "version_choisie")]
    pub package_name: String,
}

/// A validated form, ready to be sent to the backend
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Submission {
    pub package_id: String,
    pub user_form: UserForm,
}

/// The buyer's questionnaire
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FormModel {
    name: String,
    email: String,
    skills: String,
    passion: String,
    weekly_time: String,
    target_income: String,
    experience: String,
    package_id: Option<String>,
    package_name: String,
}

impl FormModel {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a raw value for an input field
    ///
    /// The package is not an input: it is chosen through [`Self::select_package`].
    pub fn set_field(&mut self, field: FormField, value: impl Into<String>) -> Result<()> {
        let value = value.into();
        match field {
            FormField::Name => self.name = value,
            FormField::Email => self.email = value,
            FormField::Skills => self.skills = value,
            FormField::Passion => self.passion = value,
            FormField::WeeklyTime => self.weekly_time = value,
            FormField::TargetIncome => self.target_income = value,
            FormField::Experience => self.experience = value,
            FormField::Package => return Err(StorefrontError::NotEditable(field)),
        }
        Ok(())
    }

    /// Record a value for a field addressed by name (English or wire name)
    pub fn set_named(&mut self, name: &str, value: impl Into<String>) -> Result<()> {
        let field: FormField = name.parse()?;
        self.set_field(field, value)
    }

    /// Current raw value of a field
    pub fn field(&self, field: FormField) -> &str {
        match field {
            FormField::Name => &self.name,
            FormField::Email => &self.email,
            FormField::Skills => &self.skills,
            FormField::Passion => &self.passion,
            FormField::WeeklyTime => &self.weekly_time,
            FormField::TargetIncome => &self.target_income,
            FormField::Experience => &self.experience,
            FormField::Package => &self.package_name,
        }
    }

    /// Select a package from the catalog, recording its id and display name
    ///
    /// An unknown id leaves the current selection untouched.
    pub fn select_package<'c>(
        &mut self,
        catalog: &'c PackageCatalog,
        id: &str,
    ) -> Result<&'c Package> {
        let package = catalog.lookup(id)?;
        self.package_id = Some(package.id.clone());
        self.package_name.clone_from(&package.name);
        Ok(package)
    }

    pub fn selected_package(&self) -> Option<&str> {
        self.package_id.as_deref()
    }

    pub fn package_name(&self) -> &str {
        &self.package_name
    }

    /// Fields that are missing or invalid; empty means the form may be submitted
    pub fn validate_for_submission(&self) -> BTreeSet<FormField> {
        let mut issues = BTreeSet::new();

        for field in [
            FormField::Name,
            FormField::Skills,
            FormField::Passion,
        ] {
            if self.field(field).trim().is_empty() {
                issues.insert(field);
            }
        }

        if !is_email(&self.email) {
            issues.insert(FormField::Email);
        }
        if WeeklyTime::from_label(&self.weekly_time).is_none() {
            issues.insert(FormField::WeeklyTime);
        }
        if TargetIncome::from_label(&self.target_income).is_none() {
            issues.insert(FormField::TargetIncome);
        }
        if Experience::from_label(&self.experience).is_none() {
            issues.insert(FormField::Experience);
        }
        if self.package_id.is_none() || self.package_name.is_empty() {
            issues.insert(FormField::Package);
        }

        issues
    }

    pub fn is_submittable(&self) -> bool {
        self.validate_for_submission().is_empty()
    }

    /// Snapshot the form for submission
    pub fn submission(&self) -> Result<Submission> {
        let issues = self.validate_for_submission();
        if !issues.is_empty() {
            return Err(StorefrontError::Validation(issues.into_iter().collect()));
        }

        let (
            Some(package_id),
            Some(weekly_time),
            Some(target_income),
            Some(experience),
        ) = (
            self.package_id.clone(),
            WeeklyTime::from_label(&self.weekly_time),
            TargetIncome::from_label(&self.target_income),
            Experience::from_label(&self.experience),
        )
        else {
            return Err(StorefrontError::Validation(vec![FormField::Package]));
        };

        Ok(Submission {
            package_id,
            user_form: UserForm {
                name: self.name.trim().to_string(),
                email: self.email.trim().to_string(),
                skills: self.skills.trim().to_string(),
                passion: self.passion.trim().to_string(),
                weekly_time,
                target_income,
                experience,
                package_name: self.package_name.clone(),
            },
        })
    }

    /// Discard every answer and the package selection
    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

/// `local@domain` with no whitespace
fn is_email(value: &str) -> bool {
    let value = value.trim();
    match value.split_once('@') {
        Some((local, domain)) => {
            !local.is_empty()
                && !domain.is_empty()
                && !domain.contains('@')
                && !value.contains(char::is_whitespace)
        }
        None => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{PREMIUM, STARTER};

    fn filled() -> FormModel {
        let catalog = PackageCatalog::standard();
        let mut form = FormModel::new();
        form.set_field(FormField::Name, "Camille").unwrap();
        form.set_field(FormField::Email, "camille@example.com").unwrap();
        form.set_field(FormField::Skills, "Marketing digital").unwrap();
        form.set_field(FormField::Passion, "Business").unwrap();
        form.set_field(FormField::WeeklyTime, "5-10 heures").unwrap();
        form.set_field(FormField::TargetIncome, "1000-3000€").unwrap();
        form.set_field(FormField::Experience, "Débutant").unwrap();
        form.select_package(&catalog, STARTER).unwrap();
        form
    }

    #[test]
    fn test_empty_form_reports_every_field() {
        let form = FormModel::new();
        let issues = form.validate_for_submission();
        assert_eq!(issues.len(), 8);
        assert!(issues.contains(&FormField::Package));
        assert!(!form.is_submittable());
    }

    #[test]
    fn test_filled_form_is_submittable() {
        assert!(filled().validate_for_submission().is_empty());
    }

    #[test]
    fn test_each_missing_field_blocks_submission() {
        for field in FormField::INPUTS {
            let mut form = filled();
            form.set_field(field, "").unwrap();
            let issues = form.validate_for_submission();
            assert_eq!(issues.into_iter().collect::<Vec<_>>(), vec![field]);
        }
    }

    #[test]
    fn test_blank_values_count_as_missing() {
        let mut form = filled();
        form.set_field(FormField::Passion, "   ").unwrap();
        assert!(form.validate_for_submission().contains(&FormField::Passion));
    }

    #[test]
    fn test_unknown_choice_is_invalid() {
        let mut form = filled();
        form.set_field(FormField::WeeklyTime, "40 heures").unwrap();
        form.set_field(FormField::Experience, "Expert").unwrap();
        let issues: Vec<_> = form.validate_for_submission().into_iter().collect();
        assert_eq!(issues, vec![FormField::WeeklyTime, FormField::Experience]);
    }

    #[test]
    fn test_email_shape() {
        assert!(is_email("a@b.fr"));
        assert!(!is_email("camille"));
        assert!(!is_email("@example.com"));
        assert!(!is_email("camille@"));
        assert!(!is_email("cam ille@example.com"));
    }

    #[test]
    fn test_missing_package_blocks_submission() {
        let mut form = filled();
        form.package_id = None;
        let err = form.submission().unwrap_err();
        assert!(matches!(err, StorefrontError::Validation(f) if f == vec![FormField::Package]));
    }

    #[test]
    fn test_select_package_denormalizes_name() {
        let catalog = PackageCatalog::standard();
        let mut form = filled();
        form.select_package(&catalog, PREMIUM).unwrap();
        assert_eq!(form.selected_package(), Some(PREMIUM));
        assert_eq!(form.package_name(), "Premium");
        assert_eq!(form.field(FormField::Package), "Premium");
    }

    #[test]
    fn test_unknown_package_keeps_selection() {
        let catalog = PackageCatalog::standard();
        let mut form = filled();
        assert!(form.select_package(&catalog, "test_full").is_err());
        assert_eq!(form.selected_package(), Some(STARTER));
    }

    #[test]
    fn test_package_is_not_editable() {
        let mut form = FormModel::new();
        assert!(matches!(
            form.set_field(FormField::Package, "Starter"),
            Err(StorefrontError::NotEditable(FormField::Package))
        ));
    }

    #[test]
    fn test_set_named_accepts_wire_names() {
        let mut form = FormModel::new();
        form.set_named("prenom", "Lucas").unwrap();
        form.set_named("revenu_vise", "5000€+").unwrap();
        form.set_named("skills", "Design").unwrap();
        assert_eq!(form.field(FormField::Name), "Lucas");
        assert_eq!(form.field(FormField::TargetIncome), "5000€+");
        assert_eq!(form.field(FormField::Skills), "Design");
        assert!(form.set_named("age", "30").is_err());
    }

    #[test]
    fn test_submission_wire_shape() {
        let submission = filled().submission().unwrap();
        assert_eq!(submission.package_id, STARTER);

        let json = serde_json::to_value(&submission.user_form).unwrap();
        assert_eq!(json["prenom"], "Camille");
        assert_eq!(json["competences"], "Marketing digital");
        assert_eq!(json["temps_semaine"], "5-10 heures");
        assert_eq!(json["revenu_vise"], "1000-3000€");
        assert_eq!(json["niveau_experience"], "Débutant");
        assert_eq!(json["version_choisie"], "Starter");
    }

    #[test]
    fn test_choice_labels_match_serde_names() {
        for choice in WeeklyTime::ALL {
            assert_eq!(serde_json::to_value(choice).unwrap(), choice.label());
        }
        for choice in TargetIncome::ALL {
            assert_eq!(serde_json::to_value(choice).unwrap(), choice.label());
        }
        for choice in Experience::ALL {
            assert_eq!(serde_json::to_value(choice).unwrap(), choice.label());
        }
    }

    #[test]
    fn test_reset() {
        let mut form = filled();
        form.reset();
        assert_eq!(form, FormModel::new());
        assert_eq!(form.selected_package(), None);
    }
}
