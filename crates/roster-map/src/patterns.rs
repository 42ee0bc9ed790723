use std::collections::BTreeMap;

use roster_model::TargetField;

use crate::utils::normalize_text;

/// Known header spellings for a target field, English and Korean.
pub fn field_patterns(field: TargetField) -> &'static [&'static str] {
    match field {
        TargetField::StudentId => &[
            "student id",
            "student number",
            "student no",
            "학번",
            "학생번호",
        ],
        TargetField::NameEn => &[
            "name",
            "english name",
            "name en",
            "name english",
            "full name",
            "영문명",
            "영문이름",
            "성명 영문",
            "성명",
            "이름",
        ],
        TargetField::NameLocal => &[
            "local name",
            "name local",
            "korean name",
            "native name",
            "한글명",
            "한글이름",
            "국문성명",
        ],
        TargetField::Nationality => &["nationality", "country", "citizenship", "국적", "국가"],
        TargetField::BirthDate => &[
            "date of birth",
            "birth date",
            "birthdate",
            "dob",
            "birthday",
            "생년월일",
        ],
        TargetField::Gender => &["gender", "sex", "성별"],
        TargetField::PassportNumber => &[
            "passport",
            "passport number",
            "passport no",
            "여권번호",
        ],
        TargetField::PassportExpiry => &[
            "passport expiry",
            "passport expiration",
            "passport expiry date",
            "여권만료일",
        ],
        TargetField::RegistrationNumber => &[
            "registration number",
            "alien registration number",
            "arc number",
            "arc no",
            "foreigner registration number",
            "외국인등록번호",
            "등록번호",
        ],
        TargetField::VisaType => &[
            "visa",
            "visa type",
            "visa status",
            "status of stay",
            "체류자격",
            "비자",
            "비자종류",
        ],
        TargetField::VisaExpiry => &[
            "visa expiry",
            "visa expiration",
            "visa expiry date",
            "period of stay",
            "체류기간",
            "체류만료일",
            "비자만료일",
        ],
        TargetField::Department => &["department", "major", "dept", "faculty", "학과", "전공", "소속"],
        TargetField::Program => &["program", "degree", "course", "학위과정", "과정", "학위"],
        TargetField::Semester => &["semester", "term", "학기"],
        TargetField::EnrollmentStatus => &[
            "enrollment status",
            "status",
            "academic status",
            "학적상태",
            "학적",
            "재학상태",
        ],
        TargetField::EnrollmentDate => &[
            "enrollment date",
            "admission date",
            "entrance date",
            "입학일",
            "입학일자",
        ],
        TargetField::AttendanceRate => &["attendance", "attendance rate", "출석률", "출석율"],
        TargetField::Gpa => &["gpa", "grade point average", "학점", "평점", "평균평점"],
        TargetField::Email => &["email", "e mail", "email address", "이메일", "전자우편"],
        TargetField::Phone => &[
            "phone",
            "phone number",
            "mobile",
            "contact",
            "telephone",
            "연락처",
            "전화번호",
            "휴대폰",
        ],
        TargetField::Address => &["address", "home address", "residence address", "주소", "거주지"],
        TargetField::InsuranceStatus => &[
            "insurance",
            "insurance status",
            "health insurance",
            "보험",
            "보험가입",
        ],
    }
}

/// Normalized patterns for every field of the schema, plus each field's
/// wire name and display label.
#[derive(Debug, Clone)]
pub struct PatternDictionary {
    patterns: BTreeMap<TargetField, Vec<String>>,
}

impl PatternDictionary {
    pub fn build() -> Self {
        let mut patterns = BTreeMap::new();
        for field in TargetField::all() {
            let mut values: Vec<String> = field_patterns(field)
                .iter()
                .map(|pattern| normalize_text(pattern))
                .collect();
            values.push(normalize_text(&split_camel_case(field.as_str())));
            values.push(normalize_text(field.label()));
            values.retain(|value| !value.is_empty());
            values.sort();
            values.dedup();
            patterns.insert(field, values);
        }
        Self { patterns }
    }

    pub fn patterns(&self, field: TargetField) -> &[String] {
        self.patterns.get(&field).map_or(&[], Vec::as_slice)
    }

    pub fn iter(&self) -> impl Iterator<Item = (TargetField, &[String])> {
        self.patterns
            .iter()
            .map(|(field, values)| (*field, values.as_slice()))
    }
}

impl Default for PatternDictionary {
    fn default() -> Self {
        Self::build()
    }
}

fn split_camel_case(name: &str) -> String {
    let mut out = String::with_capacity(name.len() + 4);
    for ch in name.chars() {
        if ch.is_ascii_uppercase() {
            out.push(' ');
        }
        out.push(ch);
    }
    out
}
