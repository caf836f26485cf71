//! Built-in tenant flows
//!
//! These are the flows the widget ships with. Each constructor builds the
//! graph step by step; construction goes through the same validation as a
//! definition loaded from disk.

use std::collections::HashMap;
use super::definition::{
    FlowDefinition, FlowOption, FlowStep, InputKind, InputStep, OptionsStep, TenantConfig,
    INITIAL_STATE,
};
use crate::utils::errors::DefinitionResult;

const END: &str = "END";

/// All built-in tenants
pub fn builtin_tenants() -> DefinitionResult<Vec<TenantConfig>> {
    Ok(vec![
        thebotagency_tenant()?,
        globalsolutions_tenant()?,
        ojk_tenant()?,
    ])
}

fn options(options: Vec<FlowOption>) -> FlowStep {
    FlowStep::Options(OptionsStep { options })
}

/// Lead generation flow for The Bot Agency
pub fn thebotagency_tenant() -> DefinitionResult<TenantConfig> {
    let mut steps = HashMap::new();

    let ask_phone = "Perfect! Could you share your phone number so our team can call or WhatsApp you with info?";
    steps.insert(INITIAL_STATE.to_string(), options(vec![
        FlowOption::new("📊 Market Survey", "COLLECT_PHONE", ask_phone).with_service("Marketing Strategies"),
        FlowOption::new("🎯 Branding", "COLLECT_PHONE", ask_phone).with_service("Branding"),
        FlowOption::new("🔍 SEO", "ASK_SEO_TYPE", "Great! Is this for a new website or an existing one?")
            .with_service("Seo"),
        FlowOption::new("💻 Website Development", "ASK_WEBSITE_TYPE", "Great choice! What kind of website are you looking for?")
            .with_service("Web Development"),
        FlowOption::new("📱 App Development", "COLLECT_PHONE", ask_phone).with_service("Tech Development"),
    ]));

    let reach_out = "Got it. Could you share your phone number so we can reach out?";
    steps.insert("ASK_WEBSITE_TYPE".to_string(), options(vec![
        FlowOption::new("Business", "COLLECT_PHONE", reach_out),
        FlowOption::new("E-Commerce", "COLLECT_PHONE", reach_out),
        FlowOption::new("Personal", "COLLECT_PHONE", reach_out),
        FlowOption::new("Other", "COLLECT_PHONE", reach_out),
    ]));

    steps.insert("ASK_SEO_TYPE".to_string(), options(vec![
        FlowOption::new("New Website", "COLLECT_PHONE", reach_out),
        FlowOption::new("Existing Website", "COLLECT_PHONE", reach_out),
    ]));

    steps.insert("COLLECT_PHONE".to_string(), FlowStep::Input(InputStep::new(
        InputKind::Phone,
        "COLLECT_EMAIL",
        "Thanks! And your best email so we can send the proposal?",
    )));

    steps.insert("COLLECT_EMAIL".to_string(), FlowStep::Input(InputStep::new(
        InputKind::Email,
        "ASK_TIMELINE",
        "Got it ✅ Our team will reach out shortly. Just two quick optional questions to help us prepare.\n\nWhen are you planning to start?",
    ).submit_on_completion()));

    let ask_budget = "And do you have a budget range in mind?";
    steps.insert("ASK_TIMELINE".to_string(), options(vec![
        FlowOption::new("Immediately", "ASK_BUDGET", ask_budget),
        FlowOption::new("1–3 Months", "ASK_BUDGET", ask_budget),
        FlowOption::new("Later", "ASK_BUDGET", ask_budget),
    ]));

    let wrap_up = "Thanks! I’ll send your info to our team. They’ll contact you shortly.\n\nWant to schedule a free consultation now?";
    steps.insert("ASK_BUDGET".to_string(), options(vec![
        FlowOption::new("Under ₹50k", "FINAL_CTA", wrap_up),
        FlowOption::new("₹50k–₹2L", "FINAL_CTA", wrap_up),
        FlowOption::new("Above ₹2L", "FINAL_CTA", wrap_up),
    ]));

    steps.insert("FINAL_CTA".to_string(), options(vec![
        FlowOption::new("📅 Book Call", END, "Great! I've opened our booking page for you.")
            .with_link("https://calendly.com/harry-thebot/consultation-with-thebot"),
        FlowOption::new("📄 View Portfolio", END, "Great! I've opened our website page for you.")
            .with_link("https://app-development-test.vercel.app"),
        FlowOption::new("❌ Not Now", END, "No problem! We'll be in touch soon. Have a great day!"),
    ]));

    steps.insert(END.to_string(), FlowStep::Terminal);

    TenantConfig::new("thebotagency", "The Bot Agency", FlowDefinition::new(INITIAL_STATE, steps)?)
}

/// Product request flow for Global Softwares
pub fn globalsolutions_tenant() -> DefinitionResult<TenantConfig> {
    let mut steps = HashMap::new();

    let ask_factory = "Great! Is this for your factory?";
    steps.insert(INITIAL_STATE.to_string(), options(vec![
        FlowOption::new("FibrePro (Order Management)", "ASK_FACTORY_GS", ask_factory).with_service("FibrePro"),
        FlowOption::new("G~Pay (HR & Payroll)", "ASK_FACTORY_GS", ask_factory).with_service("G-Pay"),
        FlowOption::new("Cammando (Production Planning)", "ASK_FACTORY_GS", ask_factory).with_service("Cammando"),
    ]));

    let ask_company = "Got it. Could you share your company name?";
    steps.insert("ASK_FACTORY_GS".to_string(), options(vec![
        FlowOption::new("Yes", "COLLECT_COMPANY_GS", ask_company),
        FlowOption::new("No", "COLLECT_COMPANY_GS", ask_company),
    ]));

    steps.insert("COLLECT_COMPANY_GS".to_string(), FlowStep::Input(InputStep::new(
        InputKind::FreeText,
        "COLLECT_EMAIL_GS",
        "Got it. Could you share your email so we can reach you out?",
    )));

    steps.insert("COLLECT_EMAIL_GS".to_string(), FlowStep::Input(InputStep::new(
        InputKind::Email,
        END,
        "We received your details. Our team will reach out to you.",
    ).submit_on_completion()));

    steps.insert(END.to_string(), FlowStep::Terminal);

    TenantConfig::new("globalsolutions", "Global Softwares", FlowDefinition::new(INITIAL_STATE, steps)?)
}

/// Job portal flow for OJK, branching into job seekers and companies
pub fn ojk_tenant() -> DefinitionResult<TenantConfig> {
    let mut steps = HashMap::new();

    steps.insert(INITIAL_STATE.to_string(), options(vec![
        FlowOption::new("👨‍💼 I am a Job Seeker", "ASK_JOB_TYPE", "Awesome! What type of job are you looking for?"),
        FlowOption::new("🏢 I am a Company", "ASK_COMPANY_NAME", "Great! Could you please share your company name?"),
    ]));

    let ask_skills = "Nice! Can you list a few of your key skills?";
    steps.insert("ASK_JOB_TYPE".to_string(), options(vec![
        FlowOption::new("IT / Software", "ASK_SKILLS", ask_skills),
        FlowOption::new("Marketing / Sales", "ASK_SKILLS", ask_skills),
        FlowOption::new("Other", "ASK_SKILLS", "Great! Can you share your top skills?"),
    ]));

    steps.insert("ASK_SKILLS".to_string(), FlowStep::Input(InputStep::new(
        InputKind::FreeText,
        "COLLECT_EMAIL_JOBSEEKER",
        "Thanks! And could you share your email so we can send you matching job opportunities?",
    )));

    steps.insert("COLLECT_EMAIL_JOBSEEKER".to_string(), FlowStep::Input(InputStep::new(
        InputKind::Email,
        END,
        "Perfect ✅ We’ll send you job alerts soon. Thanks for registering!",
    ).submit_on_completion()));

    steps.insert("ASK_COMPANY_NAME".to_string(), FlowStep::Input(InputStep::new(
        InputKind::FreeText,
        "COLLECT_EMAIL_COMPANY",
        "Got it. Could you share your work email so our team can contact you?",
    )));

    steps.insert("COLLECT_EMAIL_COMPANY".to_string(), FlowStep::Input(InputStep::new(
        InputKind::Email,
        END,
        "Perfect ✅ Our sales team will reach out with pricing and demo details.",
    ).submit_on_completion()));

    steps.insert(END.to_string(), FlowStep::Terminal);

    TenantConfig::new("ojk", "OJK Job Portal", FlowDefinition::new(INITIAL_STATE, steps)?)
}

/// The Bot Agency tenant; the built-in definitions are known to be valid
#[cfg(test)]
pub(crate) fn create_thebotagency_tenant() -> TenantConfig {
    thebotagency_tenant().expect("built-in flow is valid")
}
