//! Structured course and usage identifiers.
//!
//! Two serializations are accepted for courses: `course-v1:{org}+{course}+{run}`
//! and the deprecated slash form `{org}/{course}/{run}`. Usage keys follow the
//! course they were made from: `block-v1:...` or `i4x://...`.

use regex::Regex;
use std::fmt;
use std::str::FromStr;
use std::sync::OnceLock;
use thiserror::Error;

const ID_CHARS: &str = r"[\w\-~.:]+";

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid key: {0}")]
pub struct InvalidKeyError(pub String);

fn course_v1_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(&format!(
            r"^course-v1:(?P<org>{id})\+(?P<course>{id})\+(?P<run>{id})$",
            id = ID_CHARS
        ))
        .expect("course-v1 pattern is valid")
    })
}

fn id_part_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(&format!("^{}$", ID_CHARS)).expect("id pattern is valid"))
}

fn block_v1_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(&format!(
            r"^block-v1:(?P<org>{id})\+(?P<course>{id})\+(?P<run>{id})\+type@(?P<type>{id})\+block@(?P<block>{id})$",
            id = ID_CHARS
        ))
        .expect("block-v1 pattern is valid")
    })
}

fn i4x_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(&format!(
            r"^i4x://(?P<org>{id})/(?P<course>{id})/(?P<type>{id})/(?P<block>{id})$",
            id = ID_CHARS
        ))
        .expect("i4x pattern is valid")
    })
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CourseKey {
    org: String,
    course: String,
    run: String,
    deprecated: bool,
}

impl CourseKey {
    pub fn org(&self) -> &str {
        &self.org
    }

    pub fn course(&self) -> &str {
        &self.course
    }

    pub fn run(&self) -> &str {
        &self.run
    }

    /// True for keys parsed from the `{org}/{course}/{run}` form.
    pub fn is_deprecated(&self) -> bool {
        self.deprecated
    }

    pub fn make_usage_key(&self, block_type: &str, block_id: &str) -> UsageKey {
        UsageKey {
            org: self.org.clone(),
            course: self.course.clone(),
            run: Some(self.run.clone()),
            block_type: block_type.to_string(),
            block_id: block_id.to_string(),
            deprecated: self.deprecated,
        }
    }

    /// Usage key of the course block itself.
    pub fn course_usage_key(&self) -> UsageKey {
        if self.deprecated {
            self.make_usage_key("course", &self.run)
        } else {
            self.make_usage_key("course", "course")
        }
    }

    /// Prefix that an asset file name is appended to.
    pub fn asset_url_base(&self) -> String {
        if self.deprecated {
            format!("/c4x/{}/{}/asset/", self.org, self.course)
        } else {
            format!(
                "/asset-v1:{}+{}+{}+type@asset+block@",
                self.org, self.course, self.run
            )
        }
    }
}

impl FromStr for CourseKey {
    type Err = InvalidKeyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if let Some(caps) = course_v1_re().captures(s) {
            return Ok(Self {
                org: caps["org"].to_string(),
                course: caps["course"].to_string(),
                run: caps["run"].to_string(),
                deprecated: false,
            });
        }

        let parts: Vec<&str> = s.split('/').collect();
        if parts.len() == 3 && parts.iter().all(|p| id_part_re().is_match(p)) {
            return Ok(Self {
                org: parts[0].to_string(),
                course: parts[1].to_string(),
                run: parts[2].to_string(),
                deprecated: true,
            });
        }

        Err(InvalidKeyError(s.to_string()))
    }
}

impl fmt::Display for CourseKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.deprecated {
            write!(f, "{}/{}/{}", self.org, self.course, self.run)
        } else {
            write!(f, "course-v1:{}+{}+{}", self.org, self.course, self.run)
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct UsageKey {
    org: String,
    course: String,
    // i4x strings carry no run
    run: Option<String>,
    block_type: String,
    block_id: String,
    deprecated: bool,
}

impl UsageKey {
    pub fn block_type(&self) -> &str {
        &self.block_type
    }

    pub fn block_id(&self) -> &str {
        &self.block_id
    }

    pub fn course_key(&self) -> Option<CourseKey> {
        self.run.as_ref().map(|run| CourseKey {
            org: self.org.clone(),
            course: self.course.clone(),
            run: run.clone(),
            deprecated: self.deprecated,
        })
    }
}

impl FromStr for UsageKey {
    type Err = InvalidKeyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if let Some(caps) = block_v1_re().captures(s) {
            return Ok(Self {
                org: caps["org"].to_string(),
                course: caps["course"].to_string(),
                run: Some(caps["run"].to_string()),
                block_type: caps["type"].to_string(),
                block_id: caps["block"].to_string(),
                deprecated: false,
            });
        }
        if let Some(caps) = i4x_re().captures(s) {
            return Ok(Self {
                org: caps["org"].to_string(),
                course: caps["course"].to_string(),
                run: None,
                block_type: caps["type"].to_string(),
                block_id: caps["block"].to_string(),
                deprecated: true,
            });
        }
        Err(InvalidKeyError(s.to_string()))
    }
}

impl fmt::Display for UsageKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (&self.run, self.deprecated) {
            (Some(run), false) => write!(
                f,
                "block-v1:{}+{}+{}+type@{}+block@{}",
                self.org, self.course, run, self.block_type, self.block_id
            ),
            _ => write!(
                f,
                "i4x://{}/{}/{}/{}",
                self.org, self.course, self.block_type, self.block_id
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_course_v1() {
        let key: CourseKey = "course-v1:edX+DemoX+Demo_2015".parse().unwrap();
        assert_eq!(key.org(), "edX");
        assert_eq!(key.course(), "DemoX");
        assert_eq!(key.run(), "Demo_2015");
        assert!(!key.is_deprecated());
        assert_eq!(key.to_string(), "course-v1:edX+DemoX+Demo_2015");
    }

    #[test]
    fn test_parse_deprecated() {
        let key: CourseKey = "TestX/TS01/2015".parse().unwrap();
        assert!(key.is_deprecated());
        assert_eq!(key.to_string(), "TestX/TS01/2015");
        assert_eq!(key.asset_url_base(), "/c4x/TestX/TS01/asset/");
    }

    #[test]
    fn test_invalid_course_keys() {
        for bad in [
            "",
            "not a key",
            "TestX/TS01",
            "TestX/TS01/2015/extra",
            "TestX//2015",
            "course-v1:edX+DemoX",
            "course-v1:edX+Demo X+2015",
            "course-v1:edX+DemoX+2015+extra",
        ] {
            assert!(bad.parse::<CourseKey>().is_err(), "{bad:?} should be invalid");
        }
    }

    #[test]
    fn test_usage_keys() {
        let key: CourseKey = "TestX/TS01/2015".parse().unwrap();
        assert_eq!(
            key.make_usage_key("problem", "first_problem").to_string(),
            "i4x://TestX/TS01/problem/first_problem"
        );
        assert_eq!(
            key.course_usage_key().to_string(),
            "i4x://TestX/TS01/course/2015"
        );

        let key: CourseKey = "course-v1:edX+DemoX+Demo_2015".parse().unwrap();
        let usage = key.make_usage_key("problem", "p1");
        assert_eq!(
            usage.to_string(),
            "block-v1:edX+DemoX+Demo_2015+type@problem+block@p1"
        );
        let parsed: UsageKey = usage.to_string().parse().unwrap();
        assert_eq!(parsed, usage);
        assert_eq!(parsed.course_key(), Some(key.clone()));
        assert_eq!(
            key.asset_url_base(),
            "/asset-v1:edX+DemoX+Demo_2015+type@asset+block@"
        );
    }

    #[test]
    fn test_i4x_usage_key_has_no_course_run() {
        let parsed: UsageKey = "i4x://TestX/TS01/problem/first_problem".parse().unwrap();
        assert_eq!(parsed.block_type(), "problem");
        assert_eq!(parsed.block_id(), "first_problem");
        assert!(parsed.course_key().is_none());
        assert_eq!(parsed.to_string(), "i4x://TestX/TS01/problem/first_problem");
    }
}
