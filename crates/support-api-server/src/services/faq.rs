use once_cell::sync::Lazy;
use serde::Serialize;
use std::collections::BTreeMap;

/// One FAQ entry as served by `/faqs` and rendered into the system prompt.
#[derive(Debug, Clone, Serialize)]
pub struct FaqEntry {
    pub q: &'static str,
    pub a: &'static str,
}

/// Static FAQ table, keyed by category.
pub static FAQS: Lazy<BTreeMap<&'static str, Vec<FaqEntry>>> = Lazy::new(|| {
    let mut faqs = BTreeMap::new();
    faqs.insert(
        "shipping",
        vec![
            FaqEntry {
                q: "How long does shipping take?",
                a: "Standard shipping takes 5-7 business days. Express shipping takes 2-3 business days.",
            },
            FaqEntry {
                q: "What are shipping costs?",
                a: "Shipping costs depend on location: USA $5, International $15. Free shipping on orders over $50.",
            },
            FaqEntry {
                q: "Do you offer international shipping?",
                a: "Yes, we ship to 150+ countries. International shipping takes 10-15 business days.",
            },
        ],
    );
    faqs.insert(
        "returns",
        vec![
            FaqEntry {
                q: "What is your return policy?",
                a: "We offer 30-day returns on unused items with original packaging. Refunds processed within 5-7 business days.",
            },
            FaqEntry {
                q: "How do I initiate a return?",
                a: "Log into your account, go to Orders, select the item, and click 'Return Item'. Print the label and ship it back.",
            },
            FaqEntry {
                q: "Do you accept returns after 30 days?",
                a: "We accept returns up to 60 days with a 15% restocking fee for used items.",
            },
        ],
    );
    faqs.insert(
        "products",
        vec![
            FaqEntry {
                q: "Are your products in stock?",
                a: "Check product pages for real-time stock availability. Items show 'In Stock' or estimated delivery dates.",
            },
            FaqEntry {
                q: "Do you have a size guide?",
                a: "Yes, each product page has a detailed size guide. Click on the 'Size Chart' tab.",
            },
            FaqEntry {
                q: "Can I pre-order items?",
                a: "Yes, pre-order items are available. They ship within 2 weeks of availability.",
            },
        ],
    );
    faqs.insert(
        "payment",
        vec![
            FaqEntry {
                q: "What payment methods do you accept?",
                a: "We accept credit cards (Visa, Mastercard, Amex), PayPal, Apple Pay, and Google Pay.",
            },
            FaqEntry {
                q: "Is my payment information secure?",
                a: "Yes, we use 256-bit SSL encryption and comply with PCI DSS standards.",
            },
            FaqEntry {
                q: "Can I use multiple payment methods?",
                a: "You can use one payment method per order, but can split payments across multiple orders.",
            },
        ],
    );
    faqs.insert(
        "account",
        vec![
            FaqEntry {
                q: "How do I reset my password?",
                a: "Click 'Forgot Password' on the login page, enter your email, and follow the instructions sent to your inbox.",
            },
            FaqEntry {
                q: "How do I update my profile?",
                a: "Go to Account Settings > Profile and update your information. Click 'Save Changes' when done.",
            },
            FaqEntry {
                q: "Can I delete my account?",
                a: "Yes, go to Account Settings > Privacy and click 'Delete Account'. This action cannot be undone.",
            },
        ],
    );
    faqs
});

/// Render the FAQ table as markdown reference text for the system prompt.
pub fn faq_context() -> String {
    let mut ctx = String::from("# FAQ Database\n\n");
    for (category, entries) in FAQS.iter() {
        ctx.push_str(&format!("## {}\n", category.to_uppercase()));
        for entry in entries {
            ctx.push_str(&format!("- Q: {}\n  A: {}\n", entry.q, entry.a));
        }
        ctx.push('\n');
    }
    ctx
}

/// Full system instructions handed to the backend ahead of the history.
pub fn system_prompt() -> String {
    format!(
        "You are a professional, empathetic customer support assistant for an e-commerce company.\n\n\
         {}\n\
         INSTRUCTIONS:\n\
         1. Answer questions using the FAQ database when applicable.\n\
         2. Be helpful, professional, and concise (max 2-3 sentences).\n\
         3. If you cannot answer from FAQs, acknowledge and suggest escalation.\n\
         4. Track context from previous messages in the conversation.\n\
         5. If a customer seems frustrated or has a complex issue, recommend escalation to human support.\n\
         6. Always be honest - never make up information.\n\n\
         ESCALATION TRIGGERS:\n\
         - Complex technical issues\n\
         - Account security concerns\n\
         - Billing disputes\n\
         - Customer frustration or anger\n\
         - Issues not covered in FAQs after 2 attempts\n",
        faq_context()
    )
}
