use client_core::{
    cart::SyncState,
    notifications::Toast,
    view::{CartLineView, CartTotalsView, CartView, UploadPhaseKind, UploadView, UploadViewModel},
};

/// Prints every upload render as a short block.
pub struct TerminalUploadView;

impl UploadView for TerminalUploadView {
    fn render(&self, model: &UploadViewModel) {
        let phase = match model.phase {
            UploadPhaseKind::Empty => "empty",
            UploadPhaseKind::Selected => "selected",
            UploadPhaseKind::Submitting => "analyzing...",
            UploadPhaseKind::Succeeded => "done",
            UploadPhaseKind::Failed => "failed",
        };
        match &model.file_name {
            Some(name) => println!("[upload] {phase} ({name})"),
            None => println!("[upload] {phase}"),
        }
        if let Some(message) = &model.message {
            println!("  ! {message}");
        }

        let Some(results) = &model.results else {
            return;
        };
        println!("  breed:      {}", results.breed_name);
        println!("  confidence: {}", results.confidence);
        if !results.description.is_empty() {
            println!("  {}", results.description);
        }
        if let Some(cards) = &results.recommendations {
            println!("  recommended for {}:", results.recommendation_title);
            for card in cards {
                println!("    #{} {} - {} ({})", card.id, card.name, card.price_label, card.url);
            }
        }
    }
}

pub struct TerminalCartView;

impl CartView for TerminalCartView {
    fn render_line(&self, line: &CartLineView) {
        let state = match line.sync_state {
            SyncState::Idle => "",
            SyncState::Pending => " (saving)",
            SyncState::Error => " (error)",
        };
        match &line.item_total_label {
            Some(total) => println!(
                "[cart] line {}: qty {} = {total}{state}",
                line.line_id, line.quantity
            ),
            None => println!("[cart] line {}: qty {}{state}", line.line_id, line.quantity),
        }
    }

    fn render_totals(&self, totals: &CartTotalsView) {
        println!(
            "[cart] subtotal {} / total {}",
            totals.subtotal_label, totals.grand_total_label
        );
    }

    fn reload_page(&self) {
        println!("[cart] reloading cart from server state");
    }
}

pub fn print_toasts(toasts: &[Toast]) {
    for toast in toasts {
        println!("[{}] {}", toast.severity.as_str(), toast.message);
    }
}
