use dioxus::prelude::*;

#[component]
pub fn UploadProgress(processed: usize, total: usize) -> Element {
    let percent = if total == 0 { 100 } else { processed * 100 / total };

    rsx! {
        div {
            id: "upload-progress",
            style: "position: fixed; top: 50%; left: 50%; transform: translate(-50%, -50%);
                   background: rgba(255, 255, 255, 0.95); padding: 24px; border-radius: 8px;
                   box-shadow: 0 10px 15px -3px rgba(0, 0, 0, 0.1); z-index: 9999;
                   text-align: center; min-width: 250px;",
            "Uploading images"
            div {
                style: "width: 100%; height: 8px; background: #e5e7eb; border-radius: 4px;
                       margin-top: 12px; overflow: hidden;",
                div {
                    style: "height: 100%; width: {percent}%; background: #10b981; transition: width 0.3s ease;",
                }
            }
            div {
                style: "margin-top: 8px; font-size: 14px; color: #4b5563;",
                "Processed {processed}/{total} files ({percent}%)"
            }
        }
    }
}
