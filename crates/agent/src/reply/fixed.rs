//! Fixed replies in each supported language
//!
//! Hindi replies are romanized. Anything that asks a question ends the
//! sentence with `?` so question suppression can drop it.

use lead_agent_core::Language;

/// Fixed reply kinds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FixedReply {
    /// First contact: greeting plus language question
    Welcome,
    /// Confirmation after an explicit language choice
    LanguageConfirmed,
    /// No explicit choice; detected language is used
    LanguageAssumed,
    AskBudget,
    RepromptBudget,
    AskLocation,
    RepromptLocation,
    AskVisit,
    /// Project presentation follow-up question
    AskInterest,
    /// No project configured or mentioned
    AskWhichProject,
    HandoffAck,
    /// The one reply allowed after handoff under `acknowledge_once`
    PostHandoffAck,
    TeamHasDetails,
    GuardPersonal,
    GuardOffDomain,
    /// Used when question suppression leaves nothing to say
    SupportOnly,
}

impl FixedReply {
    pub fn text(self, language: Language) -> &'static str {
        use FixedReply::*;
        use Language::*;

        match (self, language) {
            (Welcome, _) => {
                "Hi! Thanks for reaching out. Which language do you prefer: English, Hindi or Hinglish?"
            }

            (LanguageConfirmed, English) => "Great, we will continue in English.",
            (LanguageConfirmed, Hindi) => "Theek hai, hum Hindi mein baat karenge.",
            (LanguageConfirmed, Hinglish) => "Perfect, hum Hinglish mein continue karte hain.",

            (LanguageAssumed, English) => {
                "I will continue in English. You can switch language anytime."
            }
            (LanguageAssumed, Hindi) => {
                "Main Hindi mein baat karunga. Aap kabhi bhi bhasha badal sakte hain."
            }
            (LanguageAssumed, Hinglish) => {
                "Main Hinglish mein continue karta hoon. Aap kabhi bhi language switch kar sakte ho."
            }

            (AskBudget, English) => "What budget range are you considering?",
            (AskBudget, Hindi) => "Aapka budget kitna hai?",
            (AskBudget, Hinglish) => "Aapka budget range kya hai?",

            (RepromptBudget, English) => {
                "Could you share an approximate budget, like 80 lakh or 1.2 crore?"
            }
            (RepromptBudget, Hindi) => "Kripya apna andaazan budget batayein, jaise 80 lakh ya 1.2 crore?",
            (RepromptBudget, Hinglish) => "Approx budget bata do, jaise 80 lakh ya 1.2 crore?",

            (AskLocation, English) => "Which area or location do you prefer?",
            (AskLocation, Hindi) => "Aap kis ilaake mein ghar dekh rahe hain?",
            (AskLocation, Hinglish) => "Aap kis area mein dekh rahe ho?",

            (RepromptLocation, English) => "Please share the area you prefer, for example Baner or Wakad.",
            (RepromptLocation, Hindi) => "Kripya pasand ka ilaaka batayein, jaise Baner ya Wakad.",
            (RepromptLocation, Hinglish) => "Preferred area bata do, jaise Baner ya Wakad.",

            (AskVisit, English) => {
                "Would you like to visit the site? Share a day and time that suits you."
            }
            (AskVisit, Hindi) => "Kya aap site dekhna chahenge? Apna din aur samay batayein.",
            (AskVisit, Hinglish) => "Site visit karna chahoge? Convenient din aur time bata do.",

            (AskInterest, English) => "What would you like to know more about?",
            (AskInterest, Hindi) => "Aap aur kya jaanna chahenge?",
            (AskInterest, Hinglish) => "Aur kya jaanna chahoge?",

            (AskWhichProject, English) => {
                "Please share the name of the project you are interested in, and I will help with the details."
            }
            (AskWhichProject, Hindi) => {
                "Kripya us project ka naam batayein jismein aapki ruchi hai, main jaankari dunga."
            }
            (AskWhichProject, Hinglish) => {
                "Project ka naam bata do jisme interested ho, main details share karta hoon."
            }

            (HandoffAck, English) => {
                "Great! Our advisor will call you shortly to help with the next steps."
            }
            (HandoffAck, Hindi) => "Bahut badhiya! Hamare advisor jald hi aapko call karenge.",
            (HandoffAck, Hinglish) => "Great! Hamare advisor jaldi aapko call karenge next steps ke liye.",

            (PostHandoffAck, English) => "Our advisor will connect with you shortly.",
            (PostHandoffAck, Hindi) => "Hamare advisor jald hi aapse sampark karenge.",
            (PostHandoffAck, Hinglish) => "Hamare advisor jaldi aapse connect karenge.",

            (TeamHasDetails, English) => "Our team has your details and will reach out soon.",
            (TeamHasDetails, Hindi) => "Hamari team ke paas aapki jaankari hai, jald sampark karenge.",
            (TeamHasDetails, Hinglish) => "Team ke paas aapki details hain, jaldi contact karenge.",

            (GuardPersonal, English) => {
                "I am the property assistant for this project and cannot share personal or internal details. Happy to help with anything about the property."
            }
            (GuardPersonal, Hindi) => {
                "Main is project ka property sahayak hoon, niji ya internal jaankari share nahi kar sakta. Property se jude sawaal zaroor poochiye."
            }
            (GuardPersonal, Hinglish) => {
                "Main is project ka property assistant hoon, personal ya internal details share nahi kar sakta. Property ke baare mein kuch bhi poocho."
            }

            (GuardOffDomain, English) => {
                "I can only help with questions about the property. Would you like to know about price, location or amenities?"
            }
            (GuardOffDomain, Hindi) => {
                "Main sirf property se jude sawaalon mein madad kar sakta hoon. Kya aap keemat ya location ke baare mein jaanna chahenge?"
            }
            (GuardOffDomain, Hinglish) => {
                "Main sirf property related sawaalon mein help kar sakta hoon. Price ya location ke baare mein jaanna hai?"
            }

            (SupportOnly, English) => "Sure. Our advisor will confirm any details on call.",
            (SupportOnly, Hindi) => "Zaroor. Hamare advisor call par saari jaankari confirm karenge.",
            (SupportOnly, Hinglish) => "Sure. Hamare advisor call par details confirm karenge.",
        }
    }
}

/// Acknowledges the preferred visit time before the project pitch
pub fn visit_noted(language: Language, time: &str) -> String {
    match language {
        Language::English => format!("Noted your preferred visit time: {}.", time),
        Language::Hindi => format!("Aapka pasandida samay note kar liya: {}.", time),
        Language::Hinglish => format!("Visit time note kar liya: {}.", time),
    }
}

/// Safe replies used when generation fails, rotated across failures
pub fn fallback_pool(language: Language) -> &'static [&'static str] {
    match language {
        Language::English => &[
            "Thanks for your message! Our advisor will confirm this on call.",
            "Good question. Our advisor will share the exact details with you.",
            "Noted. Our team will get back to you with the details shortly.",
        ],
        Language::Hindi => &[
            "Aapke sandesh ke liye dhanyavaad! Hamare advisor call par confirm karenge.",
            "Achha sawaal hai. Hamare advisor aapko sahi jaankari denge.",
        ],
        Language::Hinglish => &[
            "Thanks! Hamare advisor call par ye confirm kar denge.",
            "Good question. Advisor aapko exact details share karenge.",
        ],
    }
}
