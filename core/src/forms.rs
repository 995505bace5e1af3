//! Transient form sessions: signup steps, the login guard and the five-step
//! trip-planning wizard.
//!
//! None of these are persisted. Each form accumulates partial input, checks
//! it before anything is sent, and is reset once the submission succeeds.

use std::fmt;

use chrono::{NaiveDate, TimeDelta};

use crate::error::ApiError;
use crate::types::{SignupData, TravelPlanRequest};

pub const MIN_PASSWORD_LEN: usize = 8;
pub const MAX_NICKNAME_LEN: usize = 20;

/// Loose `local@domain.tld` check: no whitespace, exactly one `@`, a dot in
/// the domain with something on both sides.
pub fn is_valid_email(email: &str) -> bool {
    if email.chars().any(char::is_whitespace) {
        return false;
    }
    let Some((local, domain)) = email.split_once('@') else {
        return false;
    };
    if local.is_empty() || domain.contains('@') {
        return false;
    }
    match domain.rsplit_once('.') {
        Some((host, tld)) => !host.is_empty() && !tld.is_empty(),
        None => false,
    }
}

/// Check a complete signup payload before it is posted.
pub fn validate_signup(data: &SignupData) -> Result<(), ApiError> {
    if !is_valid_email(data.email.trim()) {
        return Err(ApiError::Validation("enter a valid email address".into()));
    }
    if data.password.chars().count() < MIN_PASSWORD_LEN {
        return Err(ApiError::Validation(format!(
            "password must be at least {MIN_PASSWORD_LEN} characters"
        )));
    }
    let nickname = data.nick_name.trim();
    if nickname.is_empty() {
        return Err(ApiError::Validation("nickname is required".into()));
    }
    if nickname.chars().count() > MAX_NICKNAME_LEN {
        return Err(ApiError::Validation(format!(
            "nickname must be at most {MAX_NICKNAME_LEN} characters"
        )));
    }
    Ok(())
}

/// Password hints shown under the input. Informational only; the hard rule
/// is `MIN_PASSWORD_LEN`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PasswordChecklist {
    pub long_enough: bool,
    pub has_upper: bool,
    pub has_lower: bool,
    pub has_digit: bool,
    pub has_special: bool,
}

impl PasswordChecklist {
    pub fn evaluate(password: &str) -> Self {
        Self {
            long_enough: password.chars().count() >= 10,
            has_upper: password.chars().any(|c| c.is_ascii_uppercase()),
            has_lower: password.chars().any(|c| c.is_ascii_lowercase()),
            has_digit: password.chars().any(|c| c.is_ascii_digit()),
            has_special: password.chars().any(|c| "!@#$%^&*".contains(c)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SignupStep {
    Email,
    Password,
    Nickname,
}

/// Partial input from one signup screen; `None` leaves the field as is.
#[derive(Debug, Clone, Default)]
pub struct SignupUpdate {
    pub email: Option<String>,
    pub password: Option<String>,
    pub nick_name: Option<String>,
}

/// Signup input accumulated across three screens.
#[derive(Debug, Clone, Default)]
pub struct SignupForm {
    data: SignupData,
    password_confirmation: String,
}

impl SignupForm {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn update(&mut self, update: SignupUpdate) {
        if let Some(email) = update.email {
            self.data.email = email;
        }
        if let Some(password) = update.password {
            self.data.password = password;
        }
        if let Some(nick_name) = update.nick_name {
            self.data.nick_name = nick_name;
        }
    }

    pub fn confirm_password(&mut self, confirmation: impl Into<String>) {
        self.password_confirmation = confirmation.into();
    }

    pub fn data(&self) -> &SignupData {
        &self.data
    }

    pub fn password_checklist(&self) -> PasswordChecklist {
        PasswordChecklist::evaluate(&self.data.password)
    }

    /// Whether the screen for `step` may advance.
    pub fn step_complete(&self, step: SignupStep) -> bool {
        match step {
            SignupStep::Email => is_valid_email(self.data.email.trim()),
            SignupStep::Password => {
                self.data.password.chars().count() >= MIN_PASSWORD_LEN
                    && self.data.password == self.password_confirmation
            }
            SignupStep::Nickname => {
                let nickname = self.data.nick_name.trim();
                !nickname.is_empty() && nickname.chars().count() <= MAX_NICKNAME_LEN
            }
        }
    }

    /// The payload to post, with email and nickname trimmed.
    pub fn validate(&self) -> Result<SignupData, ApiError> {
        let data = SignupData {
            email: self.data.email.trim().to_string(),
            password: self.data.password.clone(),
            nick_name: self.data.nick_name.trim().to_string(),
        };
        validate_signup(&data)?;
        if self.data.password != self.password_confirmation {
            return Err(ApiError::Validation("passwords do not match".into()));
        }
        Ok(data)
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

/// Credentials typed on the login screen.
#[derive(Debug, Clone, Copy)]
pub struct LoginForm<'a> {
    pub email: &'a str,
    pub password: &'a str,
}

impl<'a> LoginForm<'a> {
    pub fn new(email: &'a str, password: &'a str) -> Self {
        Self { email, password }
    }

    /// Blank email or password never reaches the network.
    pub fn validate(&self) -> Result<(), ApiError> {
        if self.email.trim().is_empty() || self.password.trim().is_empty() {
            return Err(ApiError::Validation(
                "email and password are required".into(),
            ));
        }
        Ok(())
    }
}

pub const COMPANIONS: [&str; 6] = ["본인", "친구", "연인", "가족", "아이", "부모님"];

pub const TRAVEL_STYLES: [&str; 9] = [
    "체험·액티비티",
    "SNS 핫플레이스",
    "자연과 함께",
    "유명 관광지는 필수",
    "여유롭게 힐링",
    "문화·예술·역사",
    "여행지 느낌 물씬",
    "쇼핑은 열정적으로",
    "관광보다 먹방",
];

/// Trip length as offered by the duration presets: nights away from home.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct TripDuration {
    nights: u32,
}

impl TripDuration {
    pub const DAY_TRIP: TripDuration = TripDuration { nights: 0 };

    /// 당일치기 through 5박 6일.
    pub fn presets() -> impl Iterator<Item = TripDuration> {
        (0..=5).map(TripDuration::nights)
    }

    pub fn nights(nights: u32) -> Self {
        Self { nights }
    }

    pub fn night_count(self) -> u32 {
        self.nights
    }

    pub fn days(self) -> u32 {
        self.nights + 1
    }

    /// Parses `당일치기` or `N박 M일` with `M == N + 1`.
    pub fn parse(label: &str) -> Option<Self> {
        let label = label.trim();
        if label == "당일치기" {
            return Some(Self::DAY_TRIP);
        }
        let (nights, days) = label.split_once('박')?;
        let nights: u32 = nights.trim().parse().ok()?;
        let days: u32 = days.trim().strip_suffix('일')?.trim().parse().ok()?;
        (nights > 0 && days == nights + 1).then_some(Self { nights })
    }
}

impl fmt::Display for TripDuration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.nights == 0 {
            f.write_str("당일치기")
        } else {
            write!(f, "{}박 {}일", self.nights, self.nights + 1)
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum WizardStep {
    Companions,
    Destination,
    Dates,
    Style,
    Budget,
}

impl WizardStep {
    pub const ALL: [WizardStep; 5] = [
        WizardStep::Companions,
        WizardStep::Destination,
        WizardStep::Dates,
        WizardStep::Style,
        WizardStep::Budget,
    ];

    /// 1-based position, for the progress bar.
    pub fn number(self) -> usize {
        self as usize + 1
    }

    pub fn next(self) -> Option<WizardStep> {
        WizardStep::ALL.get(self.number()).copied()
    }
}

/// Everything the wizard has collected so far. All optional until submit.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TravelPlanData {
    pub companions: Vec<String>,
    pub departure: Option<String>,
    pub destination: Option<String>,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub duration: Option<TripDuration>,
    pub style: Vec<String>,
    /// Amount in units of 10,000 won, as typed.
    pub budget: Option<String>,
}

/// The five-step trip-planning wizard.
#[derive(Debug, Clone, Default)]
pub struct TravelPlanWizard {
    data: TravelPlanData,
}

impl TravelPlanWizard {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn data(&self) -> &TravelPlanData {
        &self.data
    }

    /// Select `companion` if absent, deselect it otherwise. Blank input is
    /// ignored.
    pub fn toggle_companion(&mut self, companion: &str) {
        toggle(&mut self.data.companions, companion);
    }

    pub fn toggle_style(&mut self, style: &str) {
        toggle(&mut self.data.style, style);
    }

    pub fn set_departure(&mut self, departure: &str) {
        self.data.departure = non_blank(departure);
    }

    pub fn set_destination(&mut self, destination: &str) {
        self.data.destination = non_blank(destination);
    }

    /// Pick an explicit date range; the duration follows from it.
    pub fn set_date_range(&mut self, start: NaiveDate, end: NaiveDate) -> Result<(), ApiError> {
        if end < start {
            return Err(ApiError::Validation(
                "the trip cannot end before it starts".into(),
            ));
        }
        let nights = u32::try_from((end - start).num_days())
            .map_err(|_| ApiError::Validation("trip is too long".into()))?;
        self.data.start_date = Some(start);
        self.data.end_date = Some(end);
        self.data.duration = Some(TripDuration::nights(nights));
        Ok(())
    }

    /// Pick a duration preset. With a start date already chosen the end date
    /// is recomputed from it.
    pub fn set_duration(&mut self, duration: TripDuration) {
        self.data.duration = Some(duration);
        if let Some(start) = self.data.start_date {
            self.data.end_date = Some(start + TimeDelta::days(i64::from(duration.night_count())));
        }
    }

    pub fn set_start_date(&mut self, start: NaiveDate) {
        self.data.start_date = Some(start);
        match self.data.duration {
            Some(duration) => self.set_duration(duration),
            None => self.data.end_date = None,
        }
    }

    pub fn set_budget(&mut self, budget: &str) {
        self.data.budget = non_blank(budget);
    }

    pub fn step_complete(&self, step: WizardStep) -> bool {
        match step {
            WizardStep::Companions => !self.data.companions.is_empty(),
            WizardStep::Destination => self.data.destination.is_some(),
            WizardStep::Dates => self.data.start_date.is_some() && self.data.end_date.is_some(),
            WizardStep::Style => !self.data.style.is_empty(),
            WizardStep::Budget => self.data.budget.is_some(),
        }
    }

    /// First step that still needs input, or `None` when ready to submit.
    pub fn pending_step(&self) -> Option<WizardStep> {
        WizardStep::ALL
            .into_iter()
            .find(|step| !self.step_complete(*step))
    }

    /// Turn the collected input into the planner request.
    pub fn build_request(&self) -> Result<TravelPlanRequest, ApiError> {
        if let Some(step) = self.pending_step() {
            return Err(ApiError::Validation(format!(
                "step {} of {} is incomplete",
                step.number(),
                WizardStep::ALL.len()
            )));
        }
        let missing = || ApiError::Validation("trip plan is incomplete".into());
        let start = self.data.start_date.ok_or_else(missing)?;
        let end = self.data.end_date.ok_or_else(missing)?;
        let budget = self.data.budget.as_deref().ok_or_else(missing)?;

        Ok(TravelPlanRequest {
            companions: self.data.companions.join(", "),
            departure: self.data.departure.clone(),
            destination: self.data.destination.clone().ok_or_else(missing)?,
            start_date: start.format("%Y-%m-%d").to_string(),
            end_date: end.format("%Y-%m-%d").to_string(),
            style: self.data.style.clone(),
            budget: format!("{budget}만원"),
        })
    }

    pub fn reset(&mut self) {
        self.data = TravelPlanData::default();
    }
}

fn toggle(selected: &mut Vec<String>, value: &str) {
    let value = value.trim();
    if value.is_empty() {
        return;
    }
    match selected.iter().position(|s| s == value) {
        Some(index) => {
            selected.remove(index);
        }
        None => selected.push(value.to_string()),
    }
}

fn non_blank(s: &str) -> Option<String> {
    let s = s.trim();
    (!s.is_empty()).then(|| s.to_string())
}
