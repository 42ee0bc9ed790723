//! The fixed target schema every imported row must populate.
//!
//! The schema is a closed table of [`FieldSpec`] entries indexed by
//! [`TargetField`]. It never grows at runtime: the mapper, validator and
//! executor all iterate [`SCHEMA`] instead of branching on field names.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::ModelError;

/// A named field of the internal student schema.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum TargetField {
    StudentId,
    NameEn,
    NameLocal,
    Nationality,
    BirthDate,
    Gender,
    PassportNumber,
    PassportExpiry,
    RegistrationNumber,
    VisaType,
    VisaExpiry,
    Department,
    Program,
    Semester,
    EnrollmentStatus,
    EnrollmentDate,
    AttendanceRate,
    Gpa,
    Email,
    Phone,
    Address,
    InsuranceStatus,
}

impl TargetField {
    /// Wire name of the field (camelCase, as used in mapping files and reports).
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::StudentId => "studentId",
            Self::NameEn => "nameEn",
            Self::NameLocal => "nameLocal",
            Self::Nationality => "nationality",
            Self::BirthDate => "birthDate",
            Self::Gender => "gender",
            Self::PassportNumber => "passportNumber",
            Self::PassportExpiry => "passportExpiry",
            Self::RegistrationNumber => "registrationNumber",
            Self::VisaType => "visaType",
            Self::VisaExpiry => "visaExpiry",
            Self::Department => "department",
            Self::Program => "program",
            Self::Semester => "semester",
            Self::EnrollmentStatus => "enrollmentStatus",
            Self::EnrollmentDate => "enrollmentDate",
            Self::AttendanceRate => "attendanceRate",
            Self::Gpa => "gpa",
            Self::Email => "email",
            Self::Phone => "phone",
            Self::Address => "address",
            Self::InsuranceStatus => "insuranceStatus",
        }
    }

    /// Schema entry for this field.
    pub fn spec(self) -> &'static FieldSpec {
        // SCHEMA is declared in enum order.
        &SCHEMA[self as usize]
    }

    pub fn label(self) -> &'static str {
        self.spec().label
    }

    pub fn is_required(self) -> bool {
        self.spec().required
    }

    /// True for fields that identify a person and are stored protected.
    pub const fn is_identity(self) -> bool {
        matches!(self, Self::PassportNumber | Self::RegistrationNumber)
    }

    pub fn all() -> impl Iterator<Item = TargetField> {
        SCHEMA.iter().map(|spec| spec.field)
    }
}

impl fmt::Display for TargetField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TargetField {
    type Err = ModelError;

    /// Accepts the wire name case-insensitively, with or without `_`/`-`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted: String = s
            .trim()
            .chars()
            .filter(|ch| !matches!(ch, '_' | '-' | ' '))
            .collect();
        TargetField::all()
            .find(|field| field.as_str().eq_ignore_ascii_case(&wanted))
            .ok_or_else(|| ModelError::UnknownField(s.to_string()))
    }
}

/// Type tag of a target field; selects the coercion applied to raw cells.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FieldKind {
    /// Free text, trimmed.
    Text,
    /// Closed set of tokens with localized-label reverse lookup.
    Enum(EnumDomain),
    /// Calendar date, output as `YYYY-MM-DD`.
    Date,
    /// Number in `[0, 100]`, optional trailing `%`.
    Percentage,
    /// Bounded decimal in `[0, max]`.
    Scale { max: f64 },
    /// `local@domain.tld` shaped address.
    Email,
    /// Accepted as-is; empty becomes null.
    Passthrough,
}

#[derive(Debug, Clone, PartialEq)]
pub struct FieldSpec {
    pub field: TargetField,
    /// Display label used in operator-facing messages.
    pub label: &'static str,
    pub kind: FieldKind,
    pub required: bool,
}

const fn spec(field: TargetField, label: &'static str, kind: FieldKind, required: bool) -> FieldSpec {
    FieldSpec {
        field,
        label,
        kind,
        required,
    }
}

/// Upper bound of the grade point scale.
pub const GPA_MAX: f64 = 4.5;

pub static SCHEMA: [FieldSpec; 22] = [
    spec(TargetField::StudentId, "Student ID", FieldKind::Passthrough, false),
    spec(TargetField::NameEn, "Name (English)", FieldKind::Text, true),
    spec(TargetField::NameLocal, "Name (Local)", FieldKind::Text, false),
    spec(TargetField::Nationality, "Nationality", FieldKind::Text, true),
    spec(TargetField::BirthDate, "Date of Birth", FieldKind::Date, false),
    spec(TargetField::Gender, "Gender", FieldKind::Enum(EnumDomain::Gender), false),
    spec(TargetField::PassportNumber, "Passport Number", FieldKind::Text, false),
    spec(TargetField::PassportExpiry, "Passport Expiry", FieldKind::Date, false),
    spec(TargetField::RegistrationNumber, "Registration Number", FieldKind::Text, false),
    spec(TargetField::VisaType, "Visa Type", FieldKind::Enum(EnumDomain::VisaType), true),
    spec(TargetField::VisaExpiry, "Visa Expiry", FieldKind::Date, true),
    spec(TargetField::Department, "Department", FieldKind::Text, false),
    spec(TargetField::Program, "Program", FieldKind::Enum(EnumDomain::Program), false),
    spec(TargetField::Semester, "Semester", FieldKind::Passthrough, false),
    spec(
        TargetField::EnrollmentStatus,
        "Enrollment Status",
        FieldKind::Enum(EnumDomain::EnrollmentStatus),
        false,
    ),
    spec(TargetField::EnrollmentDate, "Enrollment Date", FieldKind::Date, false),
    spec(TargetField::AttendanceRate, "Attendance Rate", FieldKind::Percentage, false),
    spec(TargetField::Gpa, "GPA", FieldKind::Scale { max: GPA_MAX }, false),
    spec(TargetField::Email, "Email", FieldKind::Email, false),
    spec(TargetField::Phone, "Phone", FieldKind::Passthrough, false),
    spec(TargetField::Address, "Address", FieldKind::Passthrough, false),
    spec(
        TargetField::InsuranceStatus,
        "Insurance Status",
        FieldKind::Enum(EnumDomain::InsuranceStatus),
        false,
    ),
];

/// One canonical token of an enum domain with the labels that resolve to it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EnumOption {
    pub token: &'static str,
    pub labels: &'static [&'static str],
}

const fn opt(token: &'static str, labels: &'static [&'static str]) -> EnumOption {
    EnumOption { token, labels }
}

/// Closed value sets for enum-typed fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EnumDomain {
    VisaType,
    Program,
    EnrollmentStatus,
    Gender,
    InsuranceStatus,
}

const VISA_TYPES: &[EnumOption] = &[
    opt("D2", &["D-2", "유학", "student", "student visa"]),
    opt("D4", &["D-4", "일반연수", "language trainee", "general training"]),
    opt("D10", &["D-10", "구직", "job seeking"]),
    opt("F2", &["F-2", "거주", "residence"]),
    opt("F4", &["F-4", "재외동포", "overseas korean"]),
    opt("F5", &["F-5", "영주", "permanent residence"]),
    opt("H1", &["H-1", "관광취업", "working holiday"]),
    opt("OTHER", &["기타", "other"]),
];

const PROGRAMS: &[EnumOption] = &[
    opt("UNDERGRADUATE", &["학부", "학사", "bachelor", "undergraduate"]),
    opt("MASTER", &["석사", "master's", "masters"]),
    opt("DOCTORAL", &["박사", "phd", "doctorate"]),
    opt("LANGUAGE", &["어학연수", "어학", "language course"]),
    opt("EXCHANGE", &["교환학생", "교환", "exchange student"]),
    opt("RESEARCH", &["연구생", "research student"]),
];

const ENROLLMENT_STATUSES: &[EnumOption] = &[
    opt("ENROLLED", &["재학", "재학중", "enrolled"]),
    opt("ON_LEAVE", &["휴학", "on leave", "leave of absence"]),
    opt("GRADUATED", &["졸업", "graduated"]),
    opt("COMPLETED", &["수료", "completed"]),
    opt("WITHDRAWN", &["자퇴", "withdrawn"]),
    opt("EXPELLED", &["제적", "expelled"]),
];

const GENDERS: &[EnumOption] = &[
    opt("MALE", &["남", "남성", "m", "male"]),
    opt("FEMALE", &["여", "여성", "f", "female"]),
];

const INSURANCE_STATUSES: &[EnumOption] = &[
    opt("NATIONAL", &["국민건강보험", "건강보험", "national health insurance"]),
    opt("PRIVATE", &["민간보험", "사보험", "private insurance"]),
    opt("NONE", &["미가입", "없음", "none"]),
];

impl EnumDomain {
    pub const fn options(self) -> &'static [EnumOption] {
        match self {
            Self::VisaType => VISA_TYPES,
            Self::Program => PROGRAMS,
            Self::EnrollmentStatus => ENROLLMENT_STATUSES,
            Self::Gender => GENDERS,
            Self::InsuranceStatus => INSURANCE_STATUSES,
        }
    }

    /// Resolves a raw cell to its canonical token.
    ///
    /// Matches the token itself or any label, ignoring case and surrounding
    /// whitespace.
    pub fn resolve(self, raw: &str) -> Option<&'static str> {
        let needle = raw.trim();
        if needle.is_empty() {
            return None;
        }
        self.options()
            .iter()
            .find(|option| {
                option.token.eq_ignore_ascii_case(needle)
                    || option
                        .labels
                        .iter()
                        .any(|label| label.to_lowercase() == needle.to_lowercase())
            })
            .map(|option| option.token)
    }

    pub fn tokens(self) -> impl Iterator<Item = &'static str> {
        self.options().iter().map(|option| option.token)
    }
}
