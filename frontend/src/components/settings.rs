use leptos::prelude::*;
use schoolhub_shared::theme::presets;

use crate::components::layout::AppLayout;
use crate::theme::use_theme;

#[component]
pub fn SettingsPage() -> impl IntoView {
    let theme = use_theme();

    view! {
        <AppLayout title="Settings">
            <div class="card bg-base-100 shadow">
                <div class="card-body">
                    <h2 class="card-title">"Theme"</h2>
                    <p class="text-sm opacity-70">
                        {move || format!(
                            "Current: {} ({})",
                            theme.theme.with(|t| t.name.clone()),
                            if theme.is_light() { "light" } else { "dark" },
                        )}
                    </p>
                    <div class="grid grid-cols-2 md:grid-cols-3 xl:grid-cols-4 gap-4 mt-4">
                        {presets().into_iter().map(|preset| {
                            let label = preset.name.clone();
                            let swatch = format!("h-16 rounded-box border border-base-300 {}", preset.class);
                            let name = preset.name.clone();
                            let selected = Memo::new(move |_| theme.theme.with(|t| t.name == name));
                            view! {
                                <button
                                    class="flex flex-col gap-2 p-2 rounded-box hover:bg-base-200 text-left"
                                    class:ring-2=move || selected.get()
                                    class:ring-primary=move || selected.get()
                                    on:click=move |_| theme.set_theme(preset.clone())
                                >
                                    <div class=swatch></div>
                                    <span class="text-sm font-medium">{label}</span>
                                </button>
                            }
                        }).collect_view()}
                    </div>
                </div>
            </div>
        </AppLayout>
    }
}
